use formpilot_core_types::EngineError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DomError {
    /// The handle predates the document's current render pass.
    #[error("node handle is stale; the document re-rendered")]
    StaleNode,
    #[error("no such node in the document")]
    NoSuchNode,
    /// The host refused a programmatic assignment (e.g. synthetic file
    /// transfer blocked).
    #[error("assignment refused: {0}")]
    AssignmentRefused(String),
    #[error("{0}")]
    Backend(String),
}

impl From<DomError> for EngineError {
    fn from(err: DomError) -> Self {
        EngineError::new(err.to_string())
    }
}
