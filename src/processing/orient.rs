use crate::services::ocr::OcrClient;
use image::DynamicImage;
use log::{debug, warn};
use std::io::Cursor;

/// Right-angle rotations tried when straightening a scanned page.
const ROTATIONS: [u32; 4] = [0, 90, 180, 270];

/// Straightens sideways or upside-down page scans before identity
/// extraction: each right-angle rotation is run through cheap text
/// detection and the rotation the OCR engine reads the most text from
/// wins. Identity extraction tolerates small skews but not a full
/// quarter turn, so only the four cardinal rotations are scored.
pub struct OrientationCorrector;

impl OrientationCorrector {
    /// Returns the page bytes at the best-reading rotation. Pages that
    /// do not decode as images, and pages where every rotation fails
    /// text detection, pass through untouched.
    pub fn correct(page: &[u8], ocr: &dyn OcrClient) -> Vec<u8> {
        let Ok(img) = image::load_from_memory(page) else {
            return page.to_vec();
        };

        let mut best: Option<(usize, Vec<u8>)> = None;
        for degrees in ROTATIONS {
            let bytes = if degrees == 0 {
                page.to_vec()
            } else {
                match Self::encode(&Self::rotate(&img, degrees)) {
                    Some(b) => b,
                    None => continue,
                }
            };

            let score = match ocr.detect_text(&bytes) {
                Ok(lines) => Self::text_score(&lines),
                Err(err) => {
                    warn!("text detection at {} degrees failed: {}", degrees, err);
                    continue;
                }
            };
            debug!("rotation {} degrees scored {}", degrees, score);

            // Upright order wins ties, so a blank page stays as scanned.
            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, bytes));
            }
        }

        match best {
            Some((_, bytes)) => bytes,
            None => page.to_vec(),
        }
    }

    fn rotate(img: &DynamicImage, degrees: u32) -> DynamicImage {
        match degrees {
            90 => img.rotate90(),
            180 => img.rotate180(),
            _ => img.rotate270(),
        }
    }

    /// JPEG has no alpha channel, so rotated pages are flattened to RGB
    /// before re-encoding.
    fn encode(img: &DynamicImage) -> Option<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Cursor::new(Vec::new());
        rgb.write_to(&mut buf, image::ImageOutputFormat::Jpeg(90))
            .ok()?;
        Some(buf.into_inner())
    }

    fn text_score(lines: &[String]) -> usize {
        lines.iter().map(|l| l.trim().chars().count()).sum()
    }
}
