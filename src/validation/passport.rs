use crate::models::{PassportExtraction, PassportVerdict, VerdictStatus};
use crate::validation::names::names_match;
use chrono::{Local, NaiveDate};

const MIN_AGE_YEARS: i64 = 18;
const MIN_VALIDITY_DAYS: i64 = 730;

/// Checks identity consistency (name against the transcript), minimum
/// age and remaining passport validity. All problems are collected
/// into one semicolon-joined reason.
pub fn validate_passport(
    passport: Option<&PassportExtraction>,
    degree_name: Option<&str>,
) -> PassportVerdict {
    let Some(passport) = passport else {
        return PassportVerdict {
            status: VerdictStatus::NotApproved,
            reason: "Passport not uploaded".to_string(),
        };
    };

    let mut reasons: Vec<String> = Vec::new();
    let today = Local::now().date_naive();

    let matches = match (degree_name, passport.name.as_deref()) {
        (Some(degree), Some(name)) => names_match(degree, name),
        _ => false,
    };
    if !matches {
        reasons.push(
            "Name mismatch between degree certificate and passport (wrong document uploaded)"
                .to_string(),
        );
    }

    match passport.date_of_birth.as_deref() {
        None => reasons.push("Date of birth missing in passport".to_string()),
        Some(dob) => match NaiveDate::parse_from_str(dob, "%Y-%m-%d") {
            Ok(dob_date) => {
                let age_years = (today - dob_date).num_days() / 365;
                if age_years < MIN_AGE_YEARS {
                    reasons.push("Applicant age is below 18 years".to_string());
                }
            }
            Err(_) => reasons.push(format!("Unreadable date of birth in passport ({})", dob)),
        },
    }

    match passport.expiry_date.as_deref() {
        None => reasons.push("Passport expiry date missing".to_string()),
        Some(expiry) => match NaiveDate::parse_from_str(expiry, "%Y-%m-%d") {
            Ok(expiry_date) => {
                let days_left = (expiry_date - today).num_days();
                if days_left < MIN_VALIDITY_DAYS {
                    reasons.push(format!(
                        "Passport validity is less than 2 years ({} days remaining)",
                        days_left
                    ));
                }
            }
            Err(_) => reasons.push(format!("Unreadable expiry date in passport ({})", expiry)),
        },
    }

    if reasons.is_empty() {
        PassportVerdict {
            status: VerdictStatus::Approved,
            reason: "Passport validation passed".to_string(),
        }
    } else {
        PassportVerdict {
            status: VerdictStatus::NotApproved,
            reason: reasons.join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn passport(name: &str, dob_years_ago: i64, validity_days: i64) -> PassportExtraction {
        let today = Local::now().date_naive();
        PassportExtraction {
            name: Some(name.to_string()),
            date_of_birth: Some(
                (today - Duration::days(dob_years_ago * 365 + 10))
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
            expiry_date: Some((today + Duration::days(validity_days)).format("%Y-%m-%d").to_string()),
            passport_number: Some("L898902C3".to_string()),
            nationality: Some("IND".to_string()),
        }
    }

    #[test]
    fn test_valid_passport_approved() {
        let verdict = validate_passport(Some(&passport("Ravi Sharma", 20, 1000)), Some("Ravi Sharma"));
        assert_eq!(verdict.status, VerdictStatus::Approved);
    }

    #[test]
    fn test_missing_passport() {
        let verdict = validate_passport(None, Some("Ravi Sharma"));
        assert_eq!(verdict.status, VerdictStatus::NotApproved);
        assert_eq!(verdict.reason, "Passport not uploaded");
    }

    #[test]
    fn test_underage_applicant() {
        let verdict = validate_passport(Some(&passport("Ravi Sharma", 16, 1000)), Some("Ravi Sharma"));
        assert_eq!(verdict.status, VerdictStatus::NotApproved);
        assert!(verdict.reason.contains("below 18"));
    }

    #[test]
    fn test_short_validity() {
        let verdict = validate_passport(Some(&passport("Ravi Sharma", 20, 400)), Some("Ravi Sharma"));
        assert_eq!(verdict.status, VerdictStatus::NotApproved);
        assert!(verdict.reason.contains("less than 2 years"));
    }

    #[test]
    fn test_name_mismatch_collected_with_other_reasons() {
        let verdict = validate_passport(Some(&passport("Someone Else", 16, 1000)), Some("Ravi Sharma"));
        assert_eq!(verdict.status, VerdictStatus::NotApproved);
        assert!(verdict.reason.contains("Name mismatch"));
        assert!(verdict.reason.contains("; "));
    }

    #[test]
    fn test_missing_dates_reported() {
        let mut p = passport("Ravi Sharma", 20, 1000);
        p.date_of_birth = None;
        p.expiry_date = None;
        let verdict = validate_passport(Some(&p), Some("Ravi Sharma"));
        assert!(verdict.reason.contains("Date of birth missing"));
        assert!(verdict.reason.contains("expiry date missing"));
    }
}
