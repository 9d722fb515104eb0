pub mod academic;
pub mod bank;
pub mod names;
pub mod passport;

use crate::models::rules::FoundationRules;
use crate::models::{StudentOutput, StudentValidation};

/// Runs all three category validators over one student's extractions.
pub fn validate_student(output: &StudentOutput, rules: &FoundationRules) -> StudentValidation {
    let degree = match &output.certificate {
        Some(certificate) => academic::validate_degree(certificate, rules),
        None => academic::validate_degree(&Default::default(), rules),
    };

    let degree_name = output
        .certificate
        .as_ref()
        .and_then(|c| c.name_of_student.as_deref());

    StudentValidation {
        passport: passport::validate_passport(output.passport.as_ref(), degree_name),
        bank: bank::validate_bank(output.bank_statement.as_ref()),
        degree,
    }
}
