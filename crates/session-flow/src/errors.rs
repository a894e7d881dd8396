use form_inventory::InventoryError;
use formpilot_core_types::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    /// Wire-stable message; hosts surface it verbatim when a second run is
    /// requested while one is active.
    #[error("Form automation already in progress")]
    AlreadyRunning,
    #[error("invalid plan format: {0}")]
    PlanFormat(String),
    #[error("planner failed: {0}")]
    Planner(String),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl From<FlowError> for EngineError {
    fn from(err: FlowError) -> Self {
        EngineError::new(err.to_string())
    }
}
