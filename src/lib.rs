//! FormPilot CLI library: page loading, configuration, the file-backed
//! planner and attachment sources, and terminal rendering of session
//! results. The engine itself lives in the workspace crates.

pub mod attachments;
pub mod config;
pub mod panel;
pub mod planner;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dom_bridge::FixtureDom;

/// Load a page fixture document from disk.
pub fn load_page(path: &Path) -> anyhow::Result<Arc<FixtureDom>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading page fixture {}", path.display()))?;
    let dom = FixtureDom::from_json(&raw)
        .with_context(|| format!("parsing page fixture {}", path.display()))?;
    Ok(Arc::new(dom))
}
