use std::path::Path;
use std::time::Duration;

use action_executor::Tempo;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Pacing knobs, loadable from `formpilot.toml` or `FORMPILOT_*`
/// environment variables (e.g. `FORMPILOT_TEMPO__SETTLE_MS=500`).
#[derive(Clone, Debug, Deserialize)]
pub struct TempoConfig {
    pub open_delay_ms: u64,
    pub settle_ms: u64,
    pub highlight_hold_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub tempo: TempoConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("tempo.open_delay_ms", 300u64)?
            .set_default("tempo.settle_ms", 1500u64)?
            .set_default("tempo.highlight_hold_ms", 250u64)?
            .add_source(config::File::with_name("formpilot").required(false));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder
            .add_source(config::Environment::with_prefix("FORMPILOT").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn tempo(&self, cancel: CancellationToken) -> Tempo {
        Tempo::new(cancel)
            .with_open_delay(Duration::from_millis(self.tempo.open_delay_ms))
            .with_settle(Duration::from_millis(self.tempo.settle_ms))
            .with_highlight_hold(Duration::from_millis(self.tempo.highlight_hold_ms))
    }
}
