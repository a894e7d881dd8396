use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Pacing for actions against a live page. Framework-rendered widgets need
/// real time to open dropdowns and settle state machines; tests use
/// [`Tempo::instant`] and skip the waiting entirely.
#[derive(Clone)]
pub struct Tempo {
    /// Wait after the open gesture before committing a select value.
    pub open_delay: Duration,
    /// Wait after a commit before verifying it stuck.
    pub settle: Duration,
    /// How long a highlighted control stays lit.
    pub highlight_hold: Duration,
    cancel: CancellationToken,
}

impl Tempo {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            open_delay: Duration::from_millis(300),
            settle: Duration::from_millis(1500),
            highlight_hold: Duration::from_millis(250),
            cancel,
        }
    }

    /// Zero-delay tempo for tests and dry runs.
    pub fn instant() -> Self {
        Self {
            open_delay: Duration::ZERO,
            settle: Duration::ZERO,
            highlight_hold: Duration::ZERO,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_highlight_hold(mut self, hold: Duration) -> Self {
        self.highlight_hold = hold;
        self
    }

    /// Sleep that returns early on cancellation instead of erroring; the
    /// caller checks [`Tempo::cancelled`] at its next decision point.
    pub async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
