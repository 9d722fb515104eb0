use crate::utils::PipelineError;
use log::info;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Turns a document file into per-page JPEG bytes for the OCR service.
/// PDF rendering itself is an external collaborator (poppler).
pub trait PageRasterizer: Sync {
    fn pages(&self, path: &Path) -> Result<Vec<Vec<u8>>, PipelineError>;
}

/// Shells out to poppler's `pdftoppm` for PDFs; image files pass
/// through as a single page.
pub struct PopplerRasterizer {
    dpi: u32,
}

impl PopplerRasterizer {
    pub fn new() -> Self {
        PopplerRasterizer { dpi: 200 }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn pages(&self, path: &Path) -> Result<Vec<Vec<u8>>, PipelineError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if !is_pdf {
            return Ok(vec![fs::read(path)?]);
        }

        let staging = tempfile::tempdir()
            .map_err(|e| PipelineError::RasterizationError(e.to_string()))?;
        let prefix = staging.path().join("page");

        let output = Command::new("pdftoppm")
            .arg("-jpeg")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                PipelineError::RasterizationError(format!("pdftoppm not runnable: {}", e))
            })?;

        if !output.status.success() {
            return Err(PipelineError::RasterizationError(format!(
                "pdftoppm failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        // pdftoppm names pages page-1.jpg, page-2.jpg, ...; directory
        // order is not guaranteed, so sort by filename.
        let mut entries: Vec<_> = fs::read_dir(staging.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        let mut pages = Vec::new();
        for entry in entries {
            pages.push(fs::read(&entry)?);
        }

        if pages.is_empty() {
            return Err(PipelineError::RasterizationError(format!(
                "no pages rendered from {}",
                path.display()
            )));
        }

        info!("rasterized {} into {} page(s)", path.display(), pages.len());
        Ok(pages)
    }
}
