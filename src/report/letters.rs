use crate::report::excel::ReportRow;
use crate::utils::PipelineError;
use docx_rs::{Docx, Paragraph, Run};
use log::info;
use std::fs;
use std::path::Path;

const LETTER_BODY: &[&str] = &[
    "Dear {{Student_name}},",
    "",
    "We are pleased to inform you that, following the review of your \
     application documents, you have been granted conditional admission \
     to the Foundation Programme.",
    "",
    "This offer is conditional upon the verification of the original \
     documents submitted with your application, including your passport, \
     academic transcripts and proof of financial means. Please present \
     the originals during enrolment.",
    "",
    "We look forward to welcoming you.",
    "",
    "Sincerely,",
    "Admissions Office",
];

fn letter_file_name(student_name: &str) -> String {
    format!("Conditional_Offer_{}.docx", student_name.replace(' ', "_"))
}

fn build_letter(student_name: &str) -> Docx {
    let mut docx = Docx::new();
    for line in LETTER_BODY {
        let text = line.replace("{{Student_name}}", student_name);
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
    }
    docx
}

/// Writes one conditional offer letter per approved student into
/// `output_dir`. Students without a final approval get no letter.
pub fn generate_letters(rows: &[ReportRow], output_dir: &Path) -> Result<usize, PipelineError> {
    fs::create_dir_all(output_dir)?;

    let mut written = 0;
    for row in rows.iter().filter(|r| r.final_status.is_approved()) {
        let path = output_dir.join(letter_file_name(&row.passport_name));
        let file = fs::File::create(&path)?;
        build_letter(&row.passport_name)
            .build()
            .pack(file)
            .map_err(|e| PipelineError::ReportError(e.to_string()))?;
        written += 1;
    }

    info!("{} offer letter(s) written to {}", written, output_dir.display());
    Ok(written)
}
