use crate::models::{AcademicExtraction, AcademicVerdict, AcademicVerdictDetails, VerdictStatus};
use crate::models::rules::{FoundationRules, Threshold};
use chrono::{Datelike, Local};

/// Maps country aliases and spelling variants onto the names the
/// foundation rule table uses.
pub fn normalize_country(country_name: &str) -> String {
    let clean: String = country_name.to_lowercase().split_whitespace().collect();
    match clean.as_str() {
        "uae" | "unitedarabemirates" => "United Arab Emirates".to_string(),
        "us" | "usa" | "unitedstatesofamerica" => "USA".to_string(),
        "uk" | "unitedkingdom" => "United Kingdom".to_string(),
        "ivorycoast" | "cotedivoire" => "Côte d'Ivoire".to_string(),
        _ => title_case(country_name),
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>()
                    + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact grade comparison for lettered thresholds. Rule entries may
/// annotate the grade with a percentage gloss ("D7 (45%)"); the bare
/// grade token matches as well.
fn grade_matches(extracted: &str, minimum: &str) -> bool {
    let extracted = extracted.trim();
    let minimum = minimum.trim();
    let bare = minimum.split(" (").next().unwrap_or(minimum).trim();
    extracted == minimum || extracted == bare
}

fn failed(extraction: &AcademicExtraction, reason: String) -> AcademicVerdict {
    AcademicVerdict {
        status: VerdictStatus::Failed,
        eligible: false,
        reason,
        french_equivalent: None,
        semester_marks: extraction.semester_wise_marks.clone(),
        country_evidence: extraction.country_evidence.clone(),
        details: None,
    }
}

/// Checks the transcript against the per-country foundation admission
/// thresholds. Unknown countries or grading systems fail with a
/// descriptive reason instead of erroring out.
pub fn validate_degree(extraction: &AcademicExtraction, rules: &FoundationRules) -> AcademicVerdict {
    let country = match extraction.country.as_deref() {
        Some(c) if !c.trim().is_empty() => normalize_country(c),
        _ => {
            return failed(extraction, "Missing required academic information".to_string())
        }
    };
    let Some(grading_type) = extraction.grading_type.as_deref() else {
        return failed(extraction, "Missing required academic information".to_string());
    };

    let current_year = Local::now().year();
    if let Some(grad_year) = extraction.graduation_year {
        if grad_year > current_year {
            return failed(
                extraction,
                format!(
                    "Invalid graduation year ({}) - document appears future-dated",
                    grad_year
                ),
            );
        }
    }

    if !rules.has_country(&country) {
        return failed(
            extraction,
            format!("No foundation admission rules configured for {}", country),
        );
    }
    let rule = match rules.get_rule(&country, grading_type) {
        Ok(r) => r,
        Err(_) => {
            return failed(
                extraction,
                format!("Unsupported grading system '{}' for {}", grading_type, country),
            )
        }
    };

    let (passed, score_text, foundation_min_text) = match &rule.foundation_min {
        Threshold::Numeric(min) => {
            let Some(score) = extraction.cumulative_score else {
                return failed(extraction, "Missing required academic information".to_string());
            };
            (score >= *min, score.to_string(), min.to_string())
        }
        // Lettered systems (WAEC, KCSE, A-Levels, SPM) have no numeric
        // scale; the extracted grade must match the minimum exactly.
        // Table entries may carry a percentage gloss like "D7 (45%)",
        // so the bare grade token counts as a match too.
        Threshold::Grade(min_grade) => {
            let Some(grade) = extraction.cumulative_grade.as_deref() else {
                return failed(extraction, "Missing required academic information".to_string());
            };
            (
                grade_matches(grade, min_grade),
                grade.trim().to_string(),
                (*min_grade).to_string(),
            )
        }
    };

    let details = AcademicVerdictDetails {
        name: extraction.name_of_student.clone(),
        country: country.clone(),
        grading_type: grading_type.to_string(),
        score: score_text,
        foundation_min: foundation_min_text,
        scale: rule.scale.to_string(),
    };

    if passed {
        AcademicVerdict {
            status: VerdictStatus::Passed,
            eligible: true,
            reason: "Meets foundation admission criteria".to_string(),
            french_equivalent: Some(rule.french_equivalent.to_string()),
            semester_marks: extraction.semester_wise_marks.clone(),
            country_evidence: extraction.country_evidence.clone(),
            details: Some(details),
        }
    } else {
        AcademicVerdict {
            status: VerdictStatus::Failed,
            eligible: false,
            reason: match rule.foundation_min {
                Threshold::Numeric(_) => "Score below foundation minimum".to_string(),
                Threshold::Grade(_) => "Grade below foundation minimum".to_string(),
            },
            french_equivalent: None,
            semester_marks: extraction.semester_wise_marks.clone(),
            country_evidence: extraction.country_evidence.clone(),
            details: Some(details),
        }
    }
}
