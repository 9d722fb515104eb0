use crate::models::{StudentOutput, VerdictStatus};
use crate::utils::PipelineError;
use chrono::{Local, NaiveDate};
use log::info;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::collections::BTreeMap;
use std::path::Path;

const HEADERS: &[&str] = &[
    "Student Folder",
    // Passport
    "Passport Holder Name",
    "Nationality",
    "Passport No",
    "Passport Expiry",
    "DOB",
    "Age",
    "Passport File Name",
    "Passport Verification Status",
    "Passport Verdict Reason",
    // Degree
    "Degree Holder Name",
    "Semester Wise Marks",
    "Cumulative Score",
    "Course Name",
    "Institution Name",
    "Institution Country",
    "Institution Country Evidence",
    "French Equivalence",
    "Degree File Name",
    "Qualification Verification Status",
    "Qualification Verdict Reason",
    // Bank
    "Account Holder Name",
    "Monthly Average Bank Balance",
    "Closing Bank Balance",
    "Statement Period",
    "Balance Continuity Status",
    "Bank File Name",
    "Bank Statement Verification Status",
    "Bank Statement Verdict Reason",
    // English
    "English Test",
    "English Score",
    "English File",
    // Verdict
    "Final Status",
    "Detailed Reason",
];

const NOT_AVAILABLE: &str = "N/A";

/// One flattened report row; every cell already rendered to text so a
/// half-extracted student still produces a complete row.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub cells: Vec<String>,
    pub final_status: VerdictStatus,
    pub passport_name: String,
}

fn text(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or(NOT_AVAILABLE.to_string(), |v| v.to_string())
}

fn age_from_dob(dob: Option<&str>) -> String {
    dob.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| ((Local::now().date_naive() - d).num_days() / 365).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn semester_text(map: Option<&BTreeMap<String, Option<f64>>>) -> String {
    match map {
        Some(m) if !m.is_empty() => m
            .iter()
            .map(|(term, mark)| match mark {
                Some(mark) => format!("{}: {}", term, mark),
                None => format!("{}: {}", term, NOT_AVAILABLE),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn balances_text(map: &BTreeMap<String, f64>) -> String {
    if map.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    map.iter()
        .map(|(month, avg)| format!("{}: {}", month, avg))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_row(folder: &str, student: &StudentOutput) -> ReportRow {
    let certificate = student.certificate.clone().unwrap_or_default();
    let passport = student.passport.clone().unwrap_or_default();
    let bank = student.bank_statement.clone().unwrap_or_default();
    let english = student.english_test.clone().unwrap_or_default();
    let selected = &student.selected_files;

    let degree_name = certificate
        .name_of_student
        .as_deref()
        .or(passport.name.as_deref());

    let (degree_tag, degree_reason, french, semester, evidence) = match student
        .validation
        .as_ref()
        .map(|v| &v.degree)
    {
        Some(degree) => (
            if degree.status.is_approved() { "Approved" } else { "Not Approved" },
            degree.reason.clone(),
            text(degree.french_equivalent.as_deref()),
            semester_text(degree.semester_marks.as_ref()),
            text(degree.country_evidence.as_deref()),
        ),
        None => (
            "Not Approved",
            "Validation not run".to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    };

    let (passport_tag, passport_reason) = match student.validation.as_ref().map(|v| &v.passport) {
        Some(p) => (p.status.to_string(), p.reason.clone()),
        None => ("Not Approved".to_string(), "Validation not run".to_string()),
    };

    let (bank_tag, bank_reason, continuity, monthly) =
        match student.validation.as_ref().map(|v| &v.bank) {
            Some(b) => (
                b.status.to_string(),
                b.reason.clone(),
                text(b.balance_continuity.as_deref()),
                balances_text(&b.monthly_averages),
            ),
            None => (
                "Not Approved".to_string(),
                "Validation not run".to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
            ),
        };

    let english_detected = english.test_type.is_some();
    let english_tag = if english_detected { "Approved" } else { "Not Approved" };
    let english_reason = if english_detected {
        "English test detected"
    } else {
        "English test not detected or uploaded"
    };

    let approved = degree_tag == "Approved"
        && passport_tag == "Approved"
        && bank_tag == "Approved";
    let final_status = if approved {
        VerdictStatus::Approved
    } else {
        VerdictStatus::NotApproved
    };

    let detailed_reason = [
        format!("Passport: {}: {}", passport_tag, passport_reason),
        format!("Degree: {}: {}", degree_tag, degree_reason),
        format!("Bank: {}: {}", bank_tag, bank_reason),
        format!("English: {}: {}", english_tag, english_reason),
    ]
    .join(" | ");

    let closing_balance = match (bank.closing_balance, bank.currency.as_deref()) {
        (Some(balance), Some(currency)) => format!("{} {}", balance, currency),
        (Some(balance), None) => balance.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    };
    let score_value = match (certificate.cumulative_score, certificate.cumulative_grade.as_deref()) {
        (Some(s), _) => Some(s.to_string()),
        (None, Some(g)) => Some(g.to_string()),
        (None, None) => None,
    };
    let score = match (score_value, certificate.grading_type.as_deref()) {
        (Some(s), Some(g)) => format!("{} ({})", s, g),
        (Some(s), None) => s,
        _ => NOT_AVAILABLE.to_string(),
    };

    let passport_name = text(passport.name.as_deref());
    let cells = vec![
        folder.to_string(),
        passport_name.clone(),
        text(passport.nationality.as_deref()),
        text(passport.passport_number.as_deref()),
        text(passport.expiry_date.as_deref()),
        text(passport.date_of_birth.as_deref()),
        age_from_dob(passport.date_of_birth.as_deref()),
        text(selected.passport.as_deref()),
        passport_tag.clone(),
        passport_reason,
        text(degree_name),
        semester,
        score,
        text(certificate.qualification.as_deref()),
        text(certificate.institution.as_deref()),
        text(certificate.country.as_deref()),
        evidence,
        french,
        text(selected.academic.as_deref()),
        degree_tag.to_string(),
        degree_reason,
        text(bank.account_holder_name.as_deref()),
        monthly,
        closing_balance,
        text(bank.statement_period.as_deref()),
        continuity,
        text(selected.bank_statement.as_deref()),
        bank_tag,
        bank_reason,
        text(english.test_type.as_deref()),
        number(english.overall_score),
        text(selected.english_test.as_deref()),
        final_status.to_string(),
        detailed_reason,
    ];

    ReportRow {
        cells,
        final_status,
        passport_name,
    }
}

/// Writes the consolidated validation workbook, one row per student.
pub fn write_report(
    students: &BTreeMap<String, StudentOutput>,
    output: &Path,
) -> Result<Vec<ReportRow>, PipelineError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Validation")
        .map_err(|e: XlsxError| PipelineError::ReportError(e.to_string()))?;

    let header_format = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e: XlsxError| PipelineError::ReportError(e.to_string()))?;
    }

    let mut rows = Vec::new();
    for (i, (folder, student)) in students.iter().enumerate() {
        let row = build_row(folder, student);
        for (col, cell) in row.cells.iter().enumerate() {
            worksheet
                .write_string((i + 1) as u32, col as u16, cell)
                .map_err(|e: XlsxError| PipelineError::ReportError(e.to_string()))?;
        }
        rows.push(row);
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e: XlsxError| PipelineError::ReportError(e.to_string()))?;
    workbook
        .save(output)
        .map_err(|e: XlsxError| PipelineError::ReportError(e.to_string()))?;

    info!("report written to {} ({} rows)", output.display(), rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rules::FoundationRules;
    use crate::models::{AcademicExtraction, BankExtraction, PassportExtraction};
    use crate::validation::validate_student;
    use chrono::Duration;

    fn approved_student() -> StudentOutput {
        let today = Local::now().date_naive();
        let mut output = StudentOutput {
            certificate: Some(AcademicExtraction {
                name_of_student: Some("Ravi Sharma".to_string()),
                country: Some("India".to_string()),
                grading_type: Some("percentage".to_string()),
                cumulative_score: Some(78.5),
                graduation_year: Some(2023),
                ..AcademicExtraction::default()
            }),
            passport: Some(PassportExtraction {
                name: Some("Ravi Sharma".to_string()),
                date_of_birth: Some("2000-05-01".to_string()),
                expiry_date: Some((today + Duration::days(1500)).format("%Y-%m-%d").to_string()),
                passport_number: Some("Z1234567".to_string()),
                nationality: Some("IND".to_string()),
            }),
            bank_statement: Some(BankExtraction {
                currency: Some("EUR".to_string()),
                closing_balance: Some(15000.0),
                statement_period: Some("01-Jan-2024 to 31-Mar-2024".to_string()),
                ..BankExtraction::default()
            }),
            ..StudentOutput::default()
        };
        output.validation = Some(validate_student(&output, &FoundationRules::new()));
        output
    }

    #[test]
    fn test_row_width_matches_headers() {
        let row = build_row("student_1", &approved_student());
        assert_eq!(row.cells.len(), HEADERS.len());
    }

    #[test]
    fn test_all_categories_approved_yields_final_approved() {
        let row = build_row("student_1", &approved_student());
        assert_eq!(row.final_status, VerdictStatus::Approved);
        assert_eq!(row.passport_name, "Ravi Sharma");
    }

    #[test]
    fn test_missing_english_does_not_block_approval() {
        // English is report-only; final status ignores it.
        let student = approved_student();
        assert!(student.english_test.is_none());
        let row = build_row("s", &student);
        assert_eq!(row.final_status, VerdictStatus::Approved);
        assert!(row.cells.last().unwrap().contains("English: Not Approved"));
    }

    #[test]
    fn test_failed_bank_blocks_approval() {
        let mut student = approved_student();
        student.bank_statement.as_mut().unwrap().currency = Some("INR".to_string());
        student.validation = Some(validate_student(&student, &FoundationRules::new()));
        let row = build_row("s", &student);
        assert_eq!(row.final_status, VerdictStatus::NotApproved);
        assert!(row.cells.last().unwrap().contains("not in EUR"));
    }

    #[test]
    fn test_empty_student_still_builds_row() {
        let row = build_row("s", &StudentOutput::default());
        assert_eq!(row.cells.len(), HEADERS.len());
        assert_eq!(row.final_status, VerdictStatus::NotApproved);
        assert_eq!(row.passport_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_workbook_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let mut students = BTreeMap::new();
        students.insert("student_1".to_string(), approved_student());
        let rows = write_report(&students, &path).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(path.exists());
    }
}
