//! Prompt templates for the extraction and classification LLM calls.
//! Templates use a literal `{text}` / `{file_data}` placeholder filled
//! with `str::replace`, since the bodies are full of JSON braces.

pub const EXTRACTION_SYSTEM: &str = "\
You are an expert document extraction engine.

CRITICAL INSTRUCTIONS:
- You MUST return ONLY valid JSON.
- You MUST strictly follow the provided JSON schema.
- Do NOT include explanations, comments, markdown, or extra text.
- Do NOT guess or infer missing values.
- If a value is unclear or not present, return null.
- All numeric values must be real numbers (not strings).
- Date formats MUST be respected exactly.";

pub const BANK_PROMPT: &str = r#"
Extract structured bank statement data from the text below.

================ REQUIRED JSON SCHEMA =================

{
  "account_holder_name": string | null,
  "account_number": string | null,
  "currency": string | null,
  "closing_balance": number | null,
  "statement_period": string | null,
  "daywise_balances": { "DD-MM-YYYY": number } | null,
  "balance_continuity": string | null
}

================ FIELD DEFINITIONS =====================

1. account_holder_name: name of the account holder as printed.
2. account_number: bank account number or IBAN shown on the statement.
3. currency: currency code or symbol used (e.g. EUR, USD, INR, BDT).
4. statement_period: period covered (e.g. "01-Nov-2024 to 12-Feb-2025").
5. closing_balance: the balance on the most recent transaction date.
   If unclear, return null.
6. daywise_balances: DAILY closing balances as a FLAT dictionary keyed
   DD-MM-YYYY. Use the LAST balance of each date. Do NOT group by
   month. Do NOT compute averages. If unclear, return null.
7. balance_continuity: short analytical summary of balance flow, e.g.
   "Continuous and stable" or "Sudden deposit of INR 500000 on
   2024-12-28". If insufficient data, return null.

================ EXTRACTION RULES ======================

1. Do NOT infer missing balances.
2. Do NOT invent dates or amounts.
3. You are multilingual. The statement may not be in English.
4. Return ONLY valid JSON. No additional keys.

================ BANK STATEMENT TEXT ====================
{text}
"#;

pub const BALANCE_PROMPT: &str = r#"
Extract structured bank statement data from the text below.

================ REQUIRED JSON SCHEMA =================

{
  "closing_balance": number | null,
  "statement_period": string | null,
  "daywise_balances": { "DD-MM-YYYY": number } | null,
  "balance_continuity": string | null
}

================ FIELD DEFINITIONS =====================

1. closing_balance: the balance on the most recent transaction date in
   this excerpt. If unclear, return null.
2. statement_period: period covered by this excerpt.
3. daywise_balances: DAILY closing balances as a FLAT dictionary keyed
   DD-MM-YYYY. Use the LAST balance of each date. Do NOT group by
   month. Do NOT compute averages.
4. balance_continuity: short analytical summary of balance flow.

================ EXTRACTION RULES ======================

1. Do NOT infer missing balances.
2. Do NOT invent dates or amounts.
3. Return ONLY valid JSON. No additional keys.

================ BANK STATEMENT TEXT ====================
{text}
"#;

pub const PASSPORT_PROMPT: &str = r#"
Extract passport information from the input text below. The input may
contain OCR text, structured fields, and MRZ-parsed values.

================ REQUIRED JSON SCHEMA =================

{
  "name": string | null,
  "date_of_birth": "YYYY-MM-DD" | null,
  "expiry_date": "YYYY-MM-DD" | null,
  "passport_number": string | null,
  "nationality": string | null
}

================ FIELD EXTRACTION RULES =================

1. name: full name as a SINGLE STRING. If MRZ_PARSED_NAME is present it
   MUST be used; convert MRZ separators (<) into single spaces; do NOT
   reorder components; preserve spelling exactly.
2. date_of_birth: ISO YYYY-MM-DD. MRZ dates take priority. Convert MRZ
   YYMMDD carefully, using the passport expiry year to infer century.
3. expiry_date: ISO YYYY-MM-DD, from MRZ when present.
4. passport_number: document number from MRZ if available, filler
   characters (<) removed. Do NOT guess missing characters.
5. nationality: ICAO/ISO alpha-3 code when derived from MRZ (e.g. IND,
   USA, GBR); otherwise the country name exactly as shown.

ABSOLUTE PRIORITY ORDER: MRZ data > structured fields > visual OCR.

================ INPUT DATA =================
{text}
"#;

pub const ACADEMIC_PROMPT: &str = r#"
Extract structured academic information from the transcript text below.

================ REQUIRED JSON SCHEMA =================

{
  "name_of_student": string | null,
  "country": string | null,
  "country_evidence": string | null,
  "grading_type": "percentage" | "cgpa_10" | "gpa_5" | "gpa_4" | "level" | "grade" | null,
  "cumulative_score": number | null,
  "cumulative_grade": string | null,
  "institution": string | null,
  "qualification": string | null,
  "graduation_year": number | null,
  "semester_wise_marks": { "term1": number, "term2": number } | null
}

================ FIELD EXTRACTION RULES =================

1. name_of_student: full name, honorifics removed, original spelling.
2. country: country of the institution, determined ONLY from explicit
   geographic evidence (currency codes, phone codes, states, TLDs,
   official seals, national grading systems). If unsure, return null.
3. country_evidence: short explanation of the geographic signals used,
   e.g. "Phone code +91 and INR currency". If country is null, state
   why the evidence was insufficient.
4. grading_type: ONE of the listed values, or null if unclear.
5. cumulative_score: for semester-wise results, the AVERAGE of ALL
   final term totals; for GPA/CGPA systems, the final cumulative value
   directly. FLOAT only; null if it cannot be computed confidently.
6. cumulative_grade: for lettered systems (WAEC, KCSE, A-Levels, SPM,
   IGCSE), the overall letter grade exactly as printed (e.g. "D7",
   "EEE"); null for numeric systems.
7. institution: full official name.
8. qualification: the highest or latest qualification only.
9. graduation_year: completion year (YYYY), or null.
10. semester_wise_marks: final totals keyed term1, term2, ..., or null.

Conservative extraction. Multilingual input supported. Do NOT invent
missing values. Return ALL required keys. Return ONLY valid JSON.

================ TRANSCRIPT TEXT =================
{text}
"#;

pub const ENGLISH_PROMPT: &str = r#"
Extract the following fields from the English proficiency test report:

{
  "test_type": "Duolingo" | "IELTS" | "TOEFL" | "PTE" | null,
  "overall_score": number | null,
  "date_of_test": "YYYY-MM-DD" | null
}

Rules:
1. Return ONLY the JSON object.
2. If a field is not visible, return null.
3. Dates MUST be in YYYY-MM-DD.

Text:
----------------
{text}
"#;

pub const CLASSIFY_SYSTEM: &str = "\
You are a strict document triage and classification engine.

CRITICAL BEHAVIOR RULES:
- You MUST classify EVERY file provided.
- You MUST return ONLY valid JSON.
- Do NOT omit any file.
- Do NOT guess or hallucinate document types.
- CONTENT always has higher priority than filename.
- You are multilingual; documents may not be in English.";

pub const CLASSIFY_PROMPT: &str = r#"
Analyze each file using BOTH its filename and its content preview.

================ REQUIRED JSON SCHEMA =================

{
  "reasoning": string,
  "classifications": [
    {
      "filename": string,
      "document_type": "passport" | "bank_statement" | "academic" | "english_test" | "other",
      "academic_level": number | null,
      "graduation_year": number | null,
      "confidence_score": number
    }
  ]
}

================ DOCUMENT TYPE DEFINITIONS ==============

1. passport: "Passport", MRZ lines such as "P<" or "<<", nationality,
   date of birth. MRZ presence is definitive.
2. bank_statement: account number, transaction history, debit/credit,
   balance, currency symbols or codes.
3. academic: transcript, CGPA/GPA/percentage/grades, university or
   school, degree names. If the document contains NO grades or marks,
   do NOT classify it as academic.
4. english_test: IELTS / TOEFL / PTE / Duolingo, overall band score,
   section scores, test report form.
5. other: ONLY if none of the above confidently apply.

================ ACADEMIC LEVEL HIERARCHY =================

Lower number = higher level:
1 Doctorate/PhD, 2 Masters, 3 Bachelor, 4 Diploma,
5 Higher Secondary/12th/A-Level, 6 Secondary/10th/GCSE, 7 Unknown.

Assign academic_level ONLY when document_type = academic; use 7 when
the level is unclear. Extract graduation_year when visible, else null.

confidence_score: integer 1-100.

================ FILES AND PREVIEWS ========================
{file_data}
"#;
