pub mod llm;
pub mod ocr;
pub mod rasterize;
pub mod retry;

pub use llm::{HttpLlmClient, LlmClient};
pub use ocr::{HttpOcrClient, OcrClient};
pub use rasterize::{PageRasterizer, PopplerRasterizer};
