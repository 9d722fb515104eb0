use crate::models::{BankExtraction, BankSecondaryExtraction};
use crate::prompts;
use crate::services::llm::{self, LlmClient};
use crate::services::retry;
use crate::utils::PipelineError;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;

/// Separator inserted between rendered pages of a document.
pub const PAGE_BREAK: &str = "--- Page Break ---";

/// Documents at or below this many page breaks go through a single
/// full-schema extraction; longer ones are chunked.
const SINGLE_PASS_MAX_BREAKS: usize = 5;

/// Pages per chunk on the chunked path.
const CHUNK_PAGES: usize = 4;

lazy_static! {
    /// Loose date candidates inside free-form period strings, e.g.
    /// "01-Jan-2024", "01/02/2024", "01012024". The middle slot takes
    /// a month name or a numeric month/day run.
    static ref DATE_CANDIDATE: Regex =
        Regex::new(r"\d{1,4}[-/ ]?[A-Za-z\d]{0,9}[-/ ]?\d{2,4}").unwrap();
}

/// Date formats that survive the space-strip/slash-normalize cleanup.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y", "%d%m%Y", "%d-%b-%Y", "%d%b%Y", "%d-%B-%Y", "%Y-%m-%d",
];

/// Chunked LLM extraction over long bank statements, with a merge step
/// that reconciles per-chunk results into one record.
pub struct BankPipeline;

impl BankPipeline {
    pub fn split_pages(text: &str) -> Vec<String> {
        text.split(PAGE_BREAK)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn chunk_pages(pages: &[String]) -> Vec<String> {
        pages
            .chunks(CHUNK_PAGES)
            .map(|c| c.join(&format!("\n\n{}\n\n", PAGE_BREAK)))
            .collect()
    }

    pub fn extract(text: &str, llm_client: &dyn LlmClient) -> Result<BankExtraction, PipelineError> {
        let breaks = text.matches(PAGE_BREAK).count();
        if breaks <= SINGLE_PASS_MAX_BREAKS {
            info!("bank statement: single-pass extraction ({} page breaks)", breaks);
            let value = retry::with_backoff("bank-extract", retry::DEFAULT_ATTEMPTS, || {
                llm::run_llm(
                    llm_client,
                    prompts::EXTRACTION_SYSTEM,
                    &prompts::BANK_PROMPT.replace("{text}", text),
                )
            })?;
            let mut merged: BankExtraction = serde_json::from_value(value).unwrap_or_default();
            if let Some(raw_period) = &merged.statement_period {
                if let Some(derived) = Self::derive_statement_period(vec![raw_period.as_str()]) {
                    merged.statement_period = Some(derived);
                }
            }
            return Ok(merged);
        }

        let pages = Self::split_pages(text);
        let chunks = Self::chunk_pages(&pages);
        info!(
            "bank statement: chunked extraction ({} pages, {} chunks)",
            pages.len(),
            chunks.len()
        );

        // Primary chunk carries the stable account-level fields.
        let primary = retry::with_backoff("bank-extract", retry::DEFAULT_ATTEMPTS, || {
            llm::run_llm(
                llm_client,
                prompts::EXTRACTION_SYSTEM,
                &prompts::BANK_PROMPT.replace("{text}", &chunks[0]),
            )
        })?;
        let mut merged: BankExtraction = serde_json::from_value(primary).unwrap_or_default();
        let mut periods: Vec<String> = merged.statement_period.iter().cloned().collect();

        // Remaining chunks only contribute balance movement; a failed
        // chunk is skipped rather than failing the document.
        for (i, chunk) in chunks.iter().enumerate().skip(1) {
            let value = retry::with_backoff("bank-balances", retry::DEFAULT_ATTEMPTS, || {
                llm::run_llm(
                    llm_client,
                    prompts::EXTRACTION_SYSTEM,
                    &prompts::BALANCE_PROMPT.replace("{text}", chunk),
                )
            });
            let secondary: BankSecondaryExtraction = match value {
                Ok(v) => serde_json::from_value(v).unwrap_or_default(),
                Err(err) => {
                    warn!("bank chunk {}/{} failed: {}", i + 1, chunks.len(), err);
                    continue;
                }
            };
            Self::merge_secondary(&mut merged, secondary, &mut periods);
        }

        // No period string with two parseable dates means no period at
        // all; a raw pass-through would satisfy the downstream
        // statement-period check with text that never parsed.
        merged.statement_period =
            Self::derive_statement_period(periods.iter().map(String::as_str).collect());
        Ok(merged)
    }

    fn merge_secondary(
        merged: &mut BankExtraction,
        chunk: BankSecondaryExtraction,
        periods: &mut Vec<String>,
    ) {
        if chunk.closing_balance.is_some() {
            merged.closing_balance = chunk.closing_balance;
        }
        if let Some(period) = chunk.statement_period {
            periods.push(period);
        }
        if let Some(continuity) = chunk.balance_continuity {
            if !continuity.trim().is_empty() {
                merged.balance_continuity = Some(continuity);
            }
        }
        if let Some(daywise) = chunk.daywise_balances {
            let target = merged.daywise_balances.get_or_insert_with(Default::default);
            for (date, balance) in daywise {
                target.insert(date, balance);
            }
        }
    }

    /// Normalizes one date candidate into parseable shape: strip
    /// spaces, slashes become dashes.
    fn clean_candidate(raw: &str) -> String {
        raw.replace(' ', "").replace('/', "-")
    }

    fn parse_candidate(raw: &str) -> Option<NaiveDate> {
        let cleaned = Self::clean_candidate(raw);
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
    }

    /// Derives a single "<start> to <end>" period from per-chunk period
    /// strings. A string only contributes if it yields at least two
    /// parseable dates, which filters out stray amounts and years.
    pub fn derive_statement_period(periods: Vec<&str>) -> Option<String> {
        let mut dates: Vec<NaiveDate> = Vec::new();
        for period in periods {
            let parsed: Vec<NaiveDate> = DATE_CANDIDATE
                .find_iter(period)
                .filter_map(|m| Self::parse_candidate(m.as_str()))
                .collect();
            if parsed.len() >= 2 {
                dates.extend(parsed);
            }
        }

        let start = dates.iter().min()?;
        let end = dates.iter().max()?;
        Some(format!(
            "{} to {}",
            start.format("%d-%b-%Y"),
            end.format("%d-%b-%Y")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ServiceError;
    use std::sync::Mutex;

    struct ScriptedLlm {
        replies: Mutex<Vec<String>>,
        prompts_seen: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<&str>) -> Self {
            ScriptedLlm {
                replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
                prompts_seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmClient for ScriptedLlm {
        fn complete(&self, _system: &str, user: &str) -> Result<String, ServiceError> {
            self.prompts_seen.lock().unwrap().push(user.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ServiceError::Permanent("script exhausted".to_string()))
        }
    }

    fn pages(n: usize) -> String {
        (1..=n)
            .map(|i| format!("page {} txn data", i))
            .collect::<Vec<_>>()
            .join(&format!("\n{}\n", PAGE_BREAK))
    }

    #[test]
    fn test_short_statement_is_single_pass() {
        let llm = ScriptedLlm::new(vec![
            r#"{"account_holder_name": "Aisha Rahman", "currency": "EUR",
                "closing_balance": 15200.5,
                "statement_period": "01-01-2024 to 31-03-2024"}"#,
        ]);
        let text = pages(6); // 5 breaks, at the threshold
        let result = BankPipeline::extract(&text, &llm).unwrap();
        assert_eq!(result.account_holder_name.as_deref(), Some("Aisha Rahman"));
        assert_eq!(result.closing_balance, Some(15200.5));
        assert_eq!(
            result.statement_period.as_deref(),
            Some("01-Jan-2024 to 31-Mar-2024")
        );
        assert_eq!(llm.prompts_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_twelve_pages_make_three_chunks() {
        let page_list = BankPipeline::split_pages(&pages(12));
        assert_eq!(page_list.len(), 12);
        let chunks = BankPipeline::chunk_pages(&page_list);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].contains("page 1 txn data"));
        assert!(chunks[0].contains("page 4 txn data"));
        assert!(chunks[2].contains("page 12 txn data"));
    }

    #[test]
    fn test_chunked_merge_semantics() {
        let llm = ScriptedLlm::new(vec![
            r#"{"account_holder_name": "Aisha Rahman", "account_number": "IE29AIBK93115212345678",
                "currency": "EUR", "closing_balance": 9000.0,
                "statement_period": "01-Jan-2024 to 31-Jan-2024",
                "daywise_balances": {"05-01-2024": 8000.0, "20-01-2024": 9000.0},
                "balance_continuity": "Continuous and stable"}"#,
            r#"{"closing_balance": 9500.0,
                "statement_period": "01-Feb-2024 to 29-Feb-2024",
                "daywise_balances": {"20-01-2024": 9100.0, "10-02-2024": 9500.0},
                "balance_continuity": ""}"#,
            r#"{"closing_balance": 10400.0,
                "statement_period": "01-Mar-2024 to 20-Mar-2024",
                "daywise_balances": {"15-03-2024": 10400.0},
                "balance_continuity": "Large deposit of EUR 800 on 2024-03-12"}"#,
        ]);
        let result = BankPipeline::extract(&pages(12), &llm).unwrap();

        // Account-level fields come from the primary chunk only.
        assert_eq!(result.account_holder_name.as_deref(), Some("Aisha Rahman"));
        // Closing balance: last non-null wins.
        assert_eq!(result.closing_balance, Some(10400.0));
        // Day-wise: union with last-write-wins on 20-01-2024.
        let daywise = result.daywise_balances.unwrap();
        assert_eq!(daywise.get("20-01-2024"), Some(&9100.0));
        assert_eq!(daywise.len(), 4);
        // Continuity: empty strings never overwrite.
        assert_eq!(
            result.balance_continuity.as_deref(),
            Some("Large deposit of EUR 800 on 2024-03-12")
        );
        // Period: global min to global max across all chunks.
        assert_eq!(
            result.statement_period.as_deref(),
            Some("01-Jan-2024 to 20-Mar-2024")
        );
    }

    #[test]
    fn test_failed_secondary_chunk_is_skipped() {
        let llm = ScriptedLlm::new(vec![
            r#"{"currency": "EUR", "closing_balance": 5000.0,
                "statement_period": "01-Jan-2024 to 31-Jan-2024"}"#,
            "total nonsense with no json",
            r#"{"closing_balance": 6100.0,
                "statement_period": "01-Mar-2024 to 20-Mar-2024"}"#,
        ]);
        let result = BankPipeline::extract(&pages(12), &llm).unwrap();
        assert_eq!(result.closing_balance, Some(6100.0));
        assert_eq!(
            result.statement_period.as_deref(),
            Some("01-Jan-2024 to 20-Mar-2024")
        );
    }

    #[test]
    fn test_unparseable_periods_leave_period_unset() {
        let llm = ScriptedLlm::new(vec![
            r#"{"currency": "EUR", "closing_balance": 5000.0,
                "statement_period": "January to March"}"#,
            r#"{"closing_balance": 5600.0, "statement_period": "whole quarter"}"#,
            r#"{"closing_balance": 6100.0, "statement_period": "last month"}"#,
        ]);
        let result = BankPipeline::extract(&pages(12), &llm).unwrap();
        assert_eq!(result.closing_balance, Some(6100.0));
        // Nothing parsed to a date span, so the merged record carries
        // no period rather than echoing an unverified string.
        assert_eq!(result.statement_period, None);
    }

    #[test]
    fn test_period_derivation_formats() {
        assert_eq!(
            BankPipeline::derive_statement_period(vec!["01/01/2024 through 15/02/2024"]),
            Some("01-Jan-2024 to 15-Feb-2024".to_string())
        );
        assert_eq!(
            BankPipeline::derive_statement_period(vec![
                "statement for 01-Feb-2024 to 29-Feb-2024",
                "covering 10-Jan-2024 until 20-Jan-2024",
            ]),
            Some("10-Jan-2024 to 29-Feb-2024".to_string())
        );
    }

    #[test]
    fn test_period_needs_two_dates_per_string() {
        // A lone date is as likely a print date as a period bound.
        assert_eq!(
            BankPipeline::derive_statement_period(vec!["printed on 05-Jan-2024"]),
            None
        );
        assert_eq!(BankPipeline::derive_statement_period(vec!["no dates"]), None);
    }
}
