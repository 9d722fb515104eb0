use crate::models::{IdentityFields, IdentityOutcome};
use crate::processing::mrz::MrzParser;
use crate::processing::orient::OrientationCorrector;
use crate::services::ocr::OcrClient;
use crate::services::retry;
use log::{info, warn};

/// Two-strategy passport reader: a scored per-page identity-extraction
/// pass, then a universal layout-analysis fallback that hunts for raw
/// MRZ lines. A single page failing never aborts the document; only
/// total failure across both strategies yields NotDetected.
pub struct PassportReader;

impl PassportReader {
    /// Fixed presence weights; MRZ is the gold standard, the identity
    /// type and the critical dates only appear on the data page.
    pub fn score_page(fields: &IdentityFields) -> i32 {
        let mut score = 0;
        if fields.get("ID_TYPE") == Some("PASSPORT") {
            score += 50;
        }
        if fields.get("EXPIRATION_DATE").map_or(false, |v| !v.is_empty()) {
            score += 20;
        }
        if fields.get("DATE_OF_BIRTH").map_or(false, |v| !v.is_empty()) {
            score += 20;
        }
        if fields.get("MRZ_CODE").map_or(false, |v| !v.is_empty()) {
            score += 100;
        }
        score
    }

    /// Deep-parses the MRZ_CODE field and overrides the visually-read
    /// name and country, which the MRZ renders more reliably.
    pub fn apply_mrz_overrides(fields: &mut IdentityFields) {
        let Some(mrz_code) = fields.get("MRZ_CODE").map(String::from) else {
            return;
        };
        let Some(name) = MrzParser::parse_name_line(&mrz_code) else {
            return;
        };

        fields.set("MRZ_PARSED_NAME", name.full_name());
        fields.set("COUNTRY_CODE", name.country_code.clone());
        if !name.surname.is_empty() {
            fields.set("SURNAME", name.surname.clone());
        }
        if !name.given_names.is_empty() {
            fields.set("FIRST_NAME", name.given_names.clone());
        }
    }

    /// Proof that the MRZ line was read intact on the primary path.
    fn primary_success(fields: &IdentityFields) -> bool {
        fields
            .get("MRZ_CODE")
            .map_or(false, |v| v.contains("P<") && v.contains("<<"))
    }

    pub fn read(pages: &[Vec<u8>], ocr: &dyn OcrClient) -> IdentityOutcome {
        // Identity extraction cannot recover from a quarter-turn scan,
        // so every page is straightened before either strategy runs.
        let pages: Vec<Vec<u8>> = pages
            .iter()
            .map(|page| OrientationCorrector::correct(page, ocr))
            .collect();

        // Primary strategy: identity extraction per page, keep the winner.
        let mut results: Vec<IdentityFields> = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            let response = retry::with_backoff("analyze-id", retry::DEFAULT_ATTEMPTS, || {
                ocr.analyze_identity(page)
            });
            match response {
                Ok(Some(mut fields)) => {
                    Self::apply_mrz_overrides(&mut fields);
                    fields.score = Self::score_page(&fields);
                    results.push(fields);
                }
                Ok(None) => {
                    warn!("page {} is not an identity document, skipping", i + 1);
                }
                Err(err) => {
                    warn!("identity extraction failed on page {}: {}", i + 1, err);
                }
            }
        }

        // First page wins ties, matching input page order.
        let best = results
            .iter()
            .max_by(|a, b| a.score.cmp(&b.score).then(std::cmp::Ordering::Greater))
            .cloned();

        if let Some(best_page) = &best {
            if Self::primary_success(best_page) {
                info!("primary passport strategy succeeded, score {}", best_page.score);
                return IdentityOutcome::Primary(best_page.clone());
            }
        }

        warn!("primary passport strategy inconclusive, trying MRZ fallback");

        // Fallback: layout analysis, then hunt for the two MRZ lines.
        for (i, page) in pages.iter().enumerate() {
            let layout = retry::with_backoff("analyze-document", retry::DEFAULT_ATTEMPTS, || {
                ocr.analyze_layout(page)
            });
            let page_blocks = match layout {
                Ok(p) => p,
                Err(err) => {
                    warn!("fallback layout analysis failed on page {}: {}", i + 1, err);
                    continue;
                }
            };

            let lines = page_blocks.line_texts();
            let Some((line1, line2)) = MrzParser::find_mrz_lines(&lines) else {
                continue;
            };
            if !MrzParser::basic_valid(&line1, &line2) {
                continue;
            }
            match MrzParser::parse(&format!("{}\n{}", line1, line2)) {
                Ok(data) => {
                    info!("universal MRZ fallback succeeded on page {}", i + 1);
                    return IdentityOutcome::MrzFallback(data);
                }
                Err(err) => {
                    warn!("MRZ candidate on page {} failed to parse: {}", i + 1, err);
                }
            }
        }

        match best {
            Some(best_page) => {
                warn!("fallback failed, returning best-effort primary page");
                IdentityOutcome::Degraded(best_page)
            }
            None => IdentityOutcome::NotDetected,
        }
    }

    /// Serializes an outcome into the JSON text the passport LLM call
    /// consumes. None for NotDetected, which downstream reports as
    /// "manual review required".
    pub fn prompt_input(outcome: &IdentityOutcome) -> Option<String> {
        match outcome {
            IdentityOutcome::Primary(fields) | IdentityOutcome::Degraded(fields) => {
                serde_json::to_string_pretty(fields).ok()
            }
            IdentityOutcome::MrzFallback(data) => serde_json::to_string_pretty(data).ok(),
            IdentityOutcome::NotDetected => None,
        }
    }
}
