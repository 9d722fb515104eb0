use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Axis-aligned bounding box with coordinates normalized to 0..1,
/// as returned by the OCR service.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "Left")]
    pub left: f64,
    #[serde(rename = "Top")]
    pub top: f64,
    #[serde(rename = "Width")]
    pub width: f64,
    #[serde(rename = "Height")]
    pub height: f64,
}

impl BoundingBox {
    /// Rectangle intersection test. Touching edges count as overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !(self.left + self.width < other.left
            || other.left + other.width < self.left
            || self.top + self.height < other.top
            || other.top + other.height < self.top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    Table,
    Cell,
}

/// One positioned text unit from the OCR block graph. Tables and cells
/// carry no text of their own; their content is reachable through CHILD
/// relationship ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrBlock {
    pub id: String,
    pub block_type: BlockType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    /// Ids of CHILD blocks (cells of a table, words of a cell or line).
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub row_index: Option<usize>,
    #[serde(default)]
    pub column_index: Option<usize>,
}

/// Flat block graph for a single page image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrPage {
    pub blocks: Vec<OcrBlock>,
}

impl OcrPage {
    /// All LINE texts in block order.
    pub fn line_texts(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Line)
            .filter_map(|b| b.text.clone())
            .collect()
    }
}

/// One element of a reading-order document: free text or a table grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Table(Vec<Vec<String>>),
}

/// Identity fields returned by the ID-extraction service for one page,
/// keyed by field type (ID_TYPE, MRZ_CODE, DATE_OF_BIRTH, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityFields {
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub score: i32,
}

impl IdentityFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), value.into());
    }
}

/// Fully decoded two-line ICAO TD3 machine-readable zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrzData {
    pub document_type: String,
    pub passport_number: String,
    pub nationality: String,
    /// YYMMDD as printed; century inference is left to the LLM step.
    pub date_of_birth: String,
    pub sex: String,
    /// YYMMDD as printed.
    pub expiry_date: String,
    pub surname: String,
    pub given_names: String,
    pub mrz: String,
    pub source: String,
    pub confidence: f64,
}

/// Name and country fields decoded from line 1 of an MRZ string found
/// inside an identity-extraction field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MrzNameFields {
    pub country_code: String,
    pub surname: String,
    pub given_names: String,
}

impl MrzNameFields {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_names, self.surname)
            .trim()
            .to_string()
    }
}

/// Outcome of the passport strategy selector.
#[derive(Debug, Clone)]
pub enum IdentityOutcome {
    /// Primary path succeeded: identity fields with MRZ overrides.
    Primary(IdentityFields),
    /// Universal fallback succeeded: record decoded from raw MRZ lines.
    MrzFallback(MrzData),
    /// Both strategies inconclusive; best primary page returned as-is.
    Degraded(IdentityFields),
    /// No strategy produced anything usable; manual review required.
    NotDetected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassportExtraction {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub expiry_date: Option<String>,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankExtraction {
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub currency: Option<String>,
    pub closing_balance: Option<f64>,
    pub statement_period: Option<String>,
    pub balance_continuity: Option<String>,
    /// Daily closing balances keyed by date string as printed on the
    /// statement. Last write wins when chunks disagree on a date.
    pub daywise_balances: Option<BTreeMap<String, f64>>,
}

/// Reduced schema used for every chunk after the first: big-picture
/// fields (name, account number, currency) are stable across the
/// document and only extracted once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BankSecondaryExtraction {
    pub closing_balance: Option<f64>,
    pub statement_period: Option<String>,
    pub balance_continuity: Option<String>,
    pub daywise_balances: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicExtraction {
    pub name_of_student: Option<String>,
    pub country: Option<String>,
    pub country_evidence: Option<String>,
    /// percentage | cgpa_10 | gpa_5 | gpa_4 | level | grade
    pub grading_type: Option<String>,
    pub cumulative_score: Option<f64>,
    /// Letter grade for lettered systems (WAEC, KCSE, A-Levels, SPM)
    /// where no numeric cumulative score exists.
    pub cumulative_grade: Option<String>,
    pub institution: Option<String>,
    pub qualification: Option<String>,
    pub graduation_year: Option<i32>,
    pub semester_wise_marks: Option<BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnglishExtraction {
    /// Duolingo | IELTS | TOEFL | PTE
    pub test_type: Option<String>,
    pub overall_score: Option<f64>,
    pub date_of_test: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    BankStatement,
    Academic,
    EnglishTest,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileClassification {
    pub filename: String,
    pub document_type: DocumentType,
    /// 1 (PhD) .. 7 (unknown); only meaningful for academic documents.
    #[serde(default)]
    pub academic_level: Option<u8>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub confidence_score: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationReport {
    pub reasoning: Option<String>,
    pub classifications: Vec<FileClassification>,
}

/// One chosen file per document category, or None where nothing in the
/// folder was classified as that category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectedFiles {
    pub passport: Option<String>,
    pub bank_statement: Option<String>,
    pub academic: Option<String>,
    pub english_test: Option<String>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    Approved,
    NotApproved,
    Passed,
    Failed,
}

impl VerdictStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, VerdictStatus::Approved | VerdictStatus::Passed)
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerdictStatus::Approved => write!(f, "Approved"),
            VerdictStatus::NotApproved => write!(f, "Not Approved"),
            VerdictStatus::Passed => write!(f, "PASSED"),
            VerdictStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicVerdict {
    pub status: VerdictStatus,
    pub eligible: bool,
    pub reason: String,
    pub french_equivalent: Option<String>,
    pub semester_marks: Option<BTreeMap<String, Option<f64>>>,
    pub country_evidence: Option<String>,
    pub details: Option<AcademicVerdictDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicVerdictDetails {
    pub name: Option<String>,
    pub country: String,
    pub grading_type: String,
    pub score: String,
    pub foundation_min: String,
    pub scale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportVerdict {
    pub status: VerdictStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankVerdict {
    pub status: VerdictStatus,
    pub reason: String,
    pub balance_continuity: Option<String>,
    /// Month-keyed (YYYY-MM) average of the day-wise balances, derived
    /// during validation for the report.
    pub monthly_averages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentValidation {
    pub degree: AcademicVerdict,
    pub passport: PassportVerdict,
    pub bank: BankVerdict,
}

/// Everything extracted and validated for one student folder. Every
/// category slot degrades independently; a folder always produces one
/// of these, even on total failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentOutput {
    pub certificate: Option<AcademicExtraction>,
    pub passport: Option<PassportExtraction>,
    pub bank_statement: Option<BankExtraction>,
    pub english_test: Option<EnglishExtraction>,
    pub selected_files: SelectedFiles,
    pub validation: Option<StudentValidation>,
    pub processing_error: Option<String>,
}
