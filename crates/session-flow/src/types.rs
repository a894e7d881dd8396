use formpilot_core_types::{FieldResults, FormSnapshot, SessionId, SessionPhase};
use serde::{Deserialize, Serialize};

/// Caller-facing knobs for one session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Inventory the form and stop before planning.
    pub detect_only: bool,
    /// Execute the plan but never activate a submit control.
    pub prevent_submit: bool,
    /// Drop planned actions whose targets are not marked required.
    pub required_only: bool,
}

impl Default for SessionSettings {
    /// Submission is opt-in: activating a submit control is the one
    /// outward-facing act of a session, so the plan's request alone is
    /// not enough.
    fn default() -> Self {
        Self {
            detect_only: false,
            prevent_submit: true,
            required_only: false,
        }
    }
}

/// Final report of one session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionOutcome {
    #[serde(default)]
    pub session: SessionId,
    /// True when every per-field result succeeded.
    pub success: bool,
    pub message: String,
    pub phase: SessionPhase,
    pub results: FieldResults,
    pub submitted: bool,
    pub inventory: FormSnapshot,
}

impl SessionOutcome {
    pub fn error_count(&self) -> usize {
        self.results.values().filter(|r| !r.is_success()).count()
    }

    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }
}
