use crate::models::rules::FoundationRules;
use crate::models::{
    AcademicExtraction, BankExtraction, EnglishExtraction, PassportExtraction, StudentOutput,
};
use crate::processing::bank::{BankPipeline, PAGE_BREAK};
use crate::processing::{Classifier, LayoutReconstructor, PassportReader, TableMerger};
use crate::prompts;
use crate::services::llm::{self, LlmClient};
use crate::services::ocr::OcrClient;
use crate::services::rasterize::PageRasterizer;
use crate::services::retry;
use crate::utils::PipelineError;
use log::{error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Classification previews are capped to keep the one-shot prompt
/// within context limits.
const PREVIEW_CHARS: usize = 2500;

/// Rendered text shorter than this is treated as an unusable scan.
const MIN_TEXT_CHARS: usize = 10;

pub const DEFAULT_WORKERS: usize = 5;

/// Orchestrates the full per-student flow: classify the folder, pick
/// one file per category, extract, then validate. Category failures
/// degrade that category to None; only folder-level failures surface
/// as a processing error.
pub struct StudentProcessor<'a> {
    ocr: &'a dyn OcrClient,
    llm: &'a dyn LlmClient,
    rasterizer: &'a dyn PageRasterizer,
    rules: FoundationRules,
}

impl<'a> StudentProcessor<'a> {
    pub fn new(
        ocr: &'a dyn OcrClient,
        llm: &'a dyn LlmClient,
        rasterizer: &'a dyn PageRasterizer,
    ) -> Self {
        StudentProcessor {
            ocr,
            llm,
            rasterizer,
            rules: FoundationRules::new(),
        }
    }

    fn list_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| !n.starts_with('.'))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// First-page text preview for classification.
    fn preview(&self, path: &Path) -> Result<String, PipelineError> {
        let pages = self.rasterizer.pages(path)?;
        let first = pages
            .first()
            .ok_or_else(|| PipelineError::RasterizationError(Self::file_name(path)))?;
        let lines = retry::with_backoff("detect-text", retry::DEFAULT_ATTEMPTS, || {
            self.ocr.detect_text(first)
        })?;
        Ok(lines.join("\n").chars().take(PREVIEW_CHARS).collect())
    }

    /// Full text of a document: every page OCR'd, tables rebuilt and
    /// merged across page boundaries, pages joined with break markers.
    fn document_text(&self, path: &Path) -> Result<String, PipelineError> {
        let pages = self.rasterizer.pages(path)?;
        let mut rendered: Vec<String> = Vec::new();
        for page in &pages {
            let graph = retry::with_backoff("analyze-document", retry::DEFAULT_ATTEMPTS, || {
                self.ocr.analyze_layout(page)
            })?;
            let segments = TableMerger::merge(LayoutReconstructor::reconstruct(&graph));
            rendered.push(LayoutReconstructor::render(&segments));
        }
        Ok(rendered.join(&format!("\n\n{}\n\n", PAGE_BREAK)))
    }

    fn extract_passport(&self, path: &Path) -> Result<Option<PassportExtraction>, PipelineError> {
        let pages = self.rasterizer.pages(path)?;
        let outcome = PassportReader::read(&pages, self.ocr);
        let Some(input) = PassportReader::prompt_input(&outcome) else {
            warn!("no machine-readable zone detected in {}", path.display());
            return Ok(None);
        };

        let value = retry::with_backoff("passport-extract", retry::DEFAULT_ATTEMPTS, || {
            llm::run_llm(
                self.llm,
                prompts::EXTRACTION_SYSTEM,
                &prompts::PASSPORT_PROMPT.replace("{text}", &input),
            )
        })?;
        Ok(Some(serde_json::from_value(value).unwrap_or_default()))
    }

    fn extract_bank(&self, path: &Path) -> Result<Option<BankExtraction>, PipelineError> {
        let text = self.document_text(path)?;
        if text.len() < MIN_TEXT_CHARS {
            warn!("bank statement {} rendered no usable text", path.display());
            return Ok(None);
        }
        BankPipeline::extract(&text, self.llm).map(Some)
    }

    fn extract_academic(&self, path: &Path) -> Result<Option<AcademicExtraction>, PipelineError> {
        let text = self.document_text(path)?;
        if text.len() < MIN_TEXT_CHARS {
            warn!("transcript {} rendered no usable text", path.display());
            return Ok(None);
        }
        let value = retry::with_backoff("academic-extract", retry::DEFAULT_ATTEMPTS, || {
            llm::run_llm(
                self.llm,
                prompts::EXTRACTION_SYSTEM,
                &prompts::ACADEMIC_PROMPT.replace("{text}", &text),
            )
        })?;
        Ok(Some(serde_json::from_value(value).unwrap_or_default()))
    }

    fn extract_english(&self, path: &Path) -> Result<Option<EnglishExtraction>, PipelineError> {
        let text = self.document_text(path)?;
        if text.len() < MIN_TEXT_CHARS {
            warn!("test report {} rendered no usable text", path.display());
            return Ok(None);
        }
        let value = retry::with_backoff("english-extract", retry::DEFAULT_ATTEMPTS, || {
            llm::run_llm(
                self.llm,
                prompts::EXTRACTION_SYSTEM,
                &prompts::ENGLISH_PROMPT.replace("{text}", &text),
            )
        })?;
        Ok(Some(serde_json::from_value(value).unwrap_or_default()))
    }

    /// Runs one extraction category, degrading to None on failure.
    fn category<T>(
        label: &str,
        path: Option<&PathBuf>,
        run: impl FnOnce(&Path) -> Result<Option<T>, PipelineError>,
    ) -> Option<T> {
        let path = path?;
        match run(path) {
            Ok(result) => result,
            Err(err) => {
                error!("{} extraction failed for {}: {}", label, path.display(), err);
                None
            }
        }
    }

    pub fn process_student(&self, dir: &Path) -> Result<StudentOutput, PipelineError> {
        let files = Self::list_files(dir)?;
        info!("processing {} ({} files)", dir.display(), files.len());

        let mut previews: Vec<(String, String)> = Vec::new();
        for file in &files {
            match self.preview(file) {
                Ok(preview) => previews.push((Self::file_name(file), preview)),
                Err(err) => {
                    warn!("preview failed for {}: {}", file.display(), err);
                    previews.push((Self::file_name(file), String::new()));
                }
            }
        }

        let report = Classifier::classify(&previews, self.llm)?;
        let selected = Classifier::select_documents(&report);
        let resolve = |name: &Option<String>| -> Option<PathBuf> {
            name.as_ref().map(|n| dir.join(n))
        };
        let passport_file = resolve(&selected.passport);
        let bank_file = resolve(&selected.bank_statement);
        let academic_file = resolve(&selected.academic);
        let english_file = resolve(&selected.english_test);

        let mut output = StudentOutput {
            certificate: Self::category("academic", academic_file.as_ref(), |p| {
                self.extract_academic(p)
            }),
            passport: Self::category("passport", passport_file.as_ref(), |p| {
                self.extract_passport(p)
            }),
            bank_statement: Self::category("bank", bank_file.as_ref(), |p| self.extract_bank(p)),
            english_test: Self::category("english", english_file.as_ref(), |p| {
                self.extract_english(p)
            }),
            selected_files: selected,
            validation: None,
            processing_error: None,
        };
        output.validation = Some(crate::validation::validate_student(&output, &self.rules));
        Ok(output)
    }

    /// Processes every student folder under `data_dir` in parallel.
    /// A failed folder yields an error-tagged entry, never a missing
    /// one, and never aborts the batch.
    pub fn process_batch(
        &self,
        data_dir: &Path,
        workers: usize,
    ) -> Result<BTreeMap<String, StudentOutput>, PipelineError> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(data_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        info!("batch of {} student folder(s), {} workers", dirs.len(), workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| PipelineError::ValidationError(e.to_string()))?;

        let results = pool.install(|| {
            dirs.par_iter()
                .map(|dir| {
                    let key = Self::file_name(dir);
                    let output = self.process_student(dir).unwrap_or_else(|err| {
                        error!("student {} failed: {}", key, err);
                        StudentOutput {
                            processing_error: Some(err.to_string()),
                            ..StudentOutput::default()
                        }
                    });
                    (key, output)
                })
                .collect::<BTreeMap<_, _>>()
        });
        Ok(results)
    }
}
