use async_trait::async_trait;
use formpilot_core_types::{ActionRecord, EngineError, FormSnapshot, SessionPhase};
use tracing::{info, warn};

/// External decision-maker. It receives the inventory plus the history of
/// actions already taken this session and returns a raw plan document; the
/// session layer owns validation and salvage.
#[async_trait]
pub trait PlannerPort: Send + Sync {
    async fn plan(
        &self,
        snapshot: &FormSnapshot,
        history: &[ActionRecord],
    ) -> Result<serde_json::Value, EngineError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One progress tick pushed to the host UI.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub message: String,
    pub phase: SessionPhase,
    pub level: ProgressLevel,
}

pub trait ProgressPort: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

/// Progress sink that just logs; the CLI default.
pub struct TracingProgress;

impl ProgressPort for TracingProgress {
    fn emit(&self, update: ProgressUpdate) {
        match update.level {
            ProgressLevel::Warning | ProgressLevel::Error => {
                warn!(percent = update.percent, phase = %update.phase, "{}", update.message);
            }
            _ => {
                info!(percent = update.percent, phase = %update.phase, "{}", update.message);
            }
        }
    }
}
