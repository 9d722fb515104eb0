use admitcheck::pipeline::{StudentProcessor, DEFAULT_WORKERS};
use admitcheck::report;
use admitcheck::services::{HttpLlmClient, HttpOcrClient, PopplerRasterizer};
use admitcheck::utils::PipelineError;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Student application document validation: classifies each student
/// folder, extracts passports, transcripts, bank statements and test
/// reports, validates them against foundation admission rules and
/// writes the consolidated report plus conditional offer letters.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory containing one sub-folder of documents per student
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Output path of the Excel validation report
    #[arg(long, default_value = "student_validation_report.xlsx")]
    report: PathBuf,

    /// Directory receiving the generated offer letters
    #[arg(long, default_value = "generated_letters")]
    letters_dir: PathBuf,

    /// Number of students processed in parallel
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,
}

fn run(args: &Args) -> Result<(), PipelineError> {
    let ocr = HttpOcrClient::new().map_err(PipelineError::from)?;
    let llm = HttpLlmClient::new().map_err(PipelineError::from)?;
    let rasterizer = PopplerRasterizer::new();

    let processor = StudentProcessor::new(&ocr, &llm, &rasterizer);
    let results = processor.process_batch(&args.data_dir, args.workers)?;

    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, output)| output.processing_error.is_some())
        .map(|(name, _)| name.as_str())
        .collect();
    if !failed.is_empty() {
        error!("{} student(s) failed processing: {}", failed.len(), failed.join(", "));
    }

    let rows = report::write_report(&results, &args.report)?;
    let approved = rows.iter().filter(|r| r.final_status.is_approved()).count();
    let letters = report::generate_letters(&rows, &args.letters_dir)?;

    info!(
        "{} student(s) processed, {} approved, {} letter(s) generated",
        results.len(),
        approved,
        letters
    );
    Ok(())
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
