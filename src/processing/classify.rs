use crate::models::{ClassificationReport, DocumentType, SelectedFiles};
use crate::prompts;
use crate::services::llm::{self, LlmClient};
use crate::services::retry;
use crate::utils::PipelineError;
use log::info;

/// Academic level used when no classified transcript has one; worse
/// than the whole 1..=7 hierarchy so any real level beats it.
const LEVEL_SENTINEL: u8 = 8;

/// One-shot classifier over every file in a student folder, plus the
/// deterministic pick of a single winner per document category.
pub struct Classifier;

impl Classifier {
    /// Formats the (filename, preview) pairs into the classification
    /// prompt's file listing.
    pub fn file_listing(previews: &[(String, String)]) -> String {
        previews
            .iter()
            .map(|(name, preview)| format!("File: {}\nPreview:\n{}\n---", name, preview))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn classify(
        previews: &[(String, String)],
        llm_client: &dyn LlmClient,
    ) -> Result<ClassificationReport, PipelineError> {
        let listing = Self::file_listing(previews);
        let value = retry::with_backoff("classify", retry::DEFAULT_ATTEMPTS, || {
            llm::run_llm(
                llm_client,
                prompts::CLASSIFY_SYSTEM,
                &prompts::CLASSIFY_PROMPT.replace("{file_data}", &listing),
            )
        })?;

        let report: ClassificationReport = serde_json::from_value(value)
            .map_err(|e| PipelineError::ClassificationError(e.to_string()))?;
        info!(
            "classified {} of {} files",
            report.classifications.len(),
            previews.len()
        );
        Ok(report)
    }

    /// Picks one file per category. Passport, bank statement and
    /// English test take the first match in classification order. For
    /// academic documents the highest qualification wins (lowest level
    /// number); at equal level the more recent graduation year wins.
    pub fn select_documents(report: &ClassificationReport) -> SelectedFiles {
        let mut selected = SelectedFiles {
            reasoning: report.reasoning.clone(),
            ..SelectedFiles::default()
        };

        let mut best_level = LEVEL_SENTINEL;
        let mut best_year = 0i32;

        for c in &report.classifications {
            match c.document_type {
                DocumentType::Passport => {
                    if selected.passport.is_none() {
                        selected.passport = Some(c.filename.clone());
                    }
                }
                DocumentType::BankStatement => {
                    if selected.bank_statement.is_none() {
                        selected.bank_statement = Some(c.filename.clone());
                    }
                }
                DocumentType::EnglishTest => {
                    if selected.english_test.is_none() {
                        selected.english_test = Some(c.filename.clone());
                    }
                }
                DocumentType::Academic => {
                    let level = c.academic_level.unwrap_or(7);
                    let year = c.graduation_year.unwrap_or(0);
                    let wins = level < best_level || (level == best_level && year > best_year);
                    if wins {
                        best_level = level;
                        best_year = year;
                        selected.academic = Some(c.filename.clone());
                    }
                }
                DocumentType::Other => {}
            }
        }

        selected
    }
}
