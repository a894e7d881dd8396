use dom_bridge::DomError;
use field_resolver::ResolveError;
use formpilot_core_types::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    /// Wire-stable message; result panels show it verbatim.
    #[error("Element not found")]
    ElementNotFound,
    #[error("no value provided for '{0}'")]
    MissingValue(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("file assignment failed: {0}")]
    UploadAssignment(String),
    #[error("no attachment available: {0}")]
    AttachmentUnavailable(String),
    #[error("dom error: {0}")]
    Dom(#[from] DomError),
}

impl From<ResolveError> for ExecError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ElementNotFound => ExecError::ElementNotFound,
            ResolveError::Dom(inner) => ExecError::Dom(inner),
        }
    }
}

impl From<ExecError> for EngineError {
    fn from(err: ExecError) -> Self {
        EngineError::new(err.to_string())
    }
}
