use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("service call failed: {0}")]
    ServiceFailure(String),
    #[error("MRZ parsing error: {0}")]
    MrzParsingError(String),
    #[error("Rasterization error: {0}")]
    RasterizationError(String),
    #[error("Classification error: {0}")]
    ClassificationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Report error: {0}")]
    ReportError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Foundation rule not found: {0}")]
    RuleNotFound(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}

/// Failure of an external service call. Transient failures are eligible
/// for retry with backoff; permanent ones surface to the caller
/// immediately so it can degrade the affected field or category.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transient service failure: {0}")]
    Transient(String),
    #[error("permanent service failure: {0}")]
    Permanent(String),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }
}

impl From<ServiceError> for PipelineError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Transient(msg) | ServiceError::Permanent(msg) => {
                PipelineError::ServiceFailure(msg)
            }
        }
    }
}
