use dom_bridge::DomError;
use formpilot_core_types::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("dom error: {0}")]
    Dom(#[from] DomError),
}

impl From<InventoryError> for EngineError {
    fn from(err: InventoryError) -> Self {
        EngineError::new(err.to_string())
    }
}
