//! Residual failure scan.
//!
//! After the queue drains (and before any submit click) the document is
//! walked once more: interactable controls still blank get an error row so
//! the final report names what a human must finish by hand. Existing rows
//! are never overwritten; an action's own error is more informative than
//! "appears empty". Controls without an id or name are skipped, since no
//! stable key exists to report them under.

use std::collections::BTreeMap;

use dom_bridge::{ControlTag, DomError, DomPort, NodeSnapshot};
use form_inventory::labels;
use formpilot_core_types::{FieldResult, FieldResults};
use tracing::{debug, warn};

pub(crate) const EMPTY_FIELD: &str = "Field appears empty";

struct RadioTally {
    required: bool,
    any_checked: bool,
    label: String,
}

/// The scan races the page: a re-render between listing and describing
/// invalidates every handle mid-walk. One fresh pass usually recovers; if
/// the document keeps churning the scan is abandoned, leaving the results
/// already collected by the action queue untouched (it only ever adds rows).
pub(crate) async fn scan(dom: &dyn DomPort, results: &mut FieldResults) {
    for attempt in 0..2 {
        match scan_once(dom, results).await {
            Ok(()) => return,
            Err(err) if attempt == 0 => {
                debug!(error = %err, "residual scan interrupted; retrying with fresh handles");
            }
            Err(err) => warn!(error = %err, "residual scan abandoned"),
        }
    }
}

async fn scan_once(dom: &dyn DomPort, results: &mut FieldResults) -> Result<(), DomError> {
    let mut radio_groups: BTreeMap<String, RadioTally> = BTreeMap::new();

    for node in dom.controls().await? {
        let snap = dom.describe(node).await?;
        if !snap.is_interactable() || is_exempt(&snap) {
            continue;
        }
        if snap.type_is("radio") {
            let Some(name) = snap.name.clone().filter(|n| !n.is_empty()) else {
                continue;
            };
            let tally = radio_groups.entry(name).or_insert_with(|| RadioTally {
                required: false,
                any_checked: false,
                label: labels::group_label(&snap),
            });
            tally.required |= snap.required;
            tally.any_checked |= snap.checked;
            continue;
        }

        let Some(key) = stable_key(&snap) else {
            continue;
        };
        if is_blank(&snap) {
            results
                .entry(key)
                .or_insert_with(|| FieldResult::error(labels::field_label(&snap), EMPTY_FIELD));
        }
    }

    for (name, tally) in radio_groups {
        if tally.required && !tally.any_checked {
            results
                .entry(name)
                .or_insert_with(|| FieldResult::error(tally.label, EMPTY_FIELD));
        }
    }
    Ok(())
}

fn is_exempt(snap: &NodeSnapshot) -> bool {
    snap.tag == ControlTag::Button
        || snap.type_is("submit")
        || snap.type_is("button")
        || snap.type_is("reset")
        || snap.type_is("hidden")
}

fn is_blank(snap: &NodeSnapshot) -> bool {
    if snap.type_is("checkbox") {
        return snap.required && !snap.checked;
    }
    if snap.is_file_input() {
        return snap.required && snap.files.is_empty();
    }
    snap.value.trim().is_empty()
}

fn stable_key(snap: &NodeSnapshot) -> Option<String> {
    snap.dom_id
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| snap.name.clone().filter(|s| !s.is_empty()))
}
