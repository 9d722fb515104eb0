pub mod error;

pub use error::{PipelineError, ServiceError};
