use std::path::PathBuf;

use async_trait::async_trait;
use formpilot_core_types::{ActionRecord, EngineError, FormSnapshot};
use session_flow::PlannerPort;
use tracing::debug;

/// Planner that replays a plan document from disk. Stands in for the
/// remote decision-maker when running against fixture pages.
pub struct FilePlanner {
    path: PathBuf,
}

impl FilePlanner {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PlannerPort for FilePlanner {
    async fn plan(
        &self,
        snapshot: &FormSnapshot,
        history: &[ActionRecord],
    ) -> Result<serde_json::Value, EngineError> {
        debug!(
            fields = snapshot.field_count(),
            history = history.len(),
            path = %self.path.display(),
            "loading plan from file"
        );
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| EngineError::new(format!("reading plan {}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| EngineError::new(format!("parsing plan {}: {e}", self.path.display())))
    }
}
