//! Select commit protocol.
//!
//! Framework-rendered selects (React-Select and friends) ignore a bare
//! value assignment, so the commit is staged: a real open gesture, a pause
//! for the widget's own state machine, the native-setter commit with change
//! and blur notifications, a settle pause, then read-back verification. A
//! value that did not stick gets exactly one retry; after that any hidden
//! mirror inputs sharing the control's name are synchronized so the form
//! serializes the right value even if the visible widget disagrees.

use dom_bridge::{DomEvent, DomPort, NodeId, NodeSnapshot, OptionState};
use tracing::{debug, warn};

use crate::errors::ExecError;
use crate::executor::Applied;
use crate::tempo::Tempo;

pub(crate) async fn run(
    dom: &dyn DomPort,
    tempo: &Tempo,
    node: NodeId,
    wanted: &str,
) -> Result<Applied, ExecError> {
    let snap = dom.describe(node).await?;

    // A select with no rendered options is a custom widget shell; commit the
    // raw value and let its own listeners react.
    if snap.options.is_empty() {
        dom.set_value(node, wanted).await?;
        dom.dispatch(node, DomEvent::Change).await?;
        return Ok(Applied::with_value(wanted));
    }

    let mut applied = Applied::default();
    let option = match match_option(&snap.options, wanted) {
        Some(option) => option,
        None => {
            let first = &snap.options[0];
            warn!(wanted, fallback = %first.value, "no option matched; selecting first option");
            applied.warn(format!(
                "no option matched '{wanted}'; selected '{}' instead",
                display_text(first)
            ));
            first
        }
    };

    open_gesture(dom, node).await?;
    tempo.pause(tempo.open_delay).await;

    commit(dom, node, &option.value).await?;
    tempo.pause(tempo.settle).await;

    if verified(dom, node, &option.value).await? {
        applied.value = Some(display_text(option));
        return Ok(applied);
    }

    debug!(value = %option.value, "select value did not stick; retrying once");
    commit(dom, node, &option.value).await?;
    tempo.pause(tempo.settle).await;

    if !verified(dom, node, &option.value).await? {
        let mirrors = sync_hidden_mirrors(dom, &snap, &option.value).await?;
        applied.warn(format!(
            "select value did not verify after retry; synchronized {mirrors} hidden input(s)"
        ));
    }
    applied.value = Some(display_text(option));
    Ok(applied)
}

/// Exact value, then exact visible text, then a substring of the text.
/// All comparisons are case-insensitive.
fn match_option<'a>(options: &'a [OptionState], wanted: &str) -> Option<&'a OptionState> {
    let needle = wanted.trim().to_lowercase();
    options
        .iter()
        .find(|o| o.value.to_lowercase() == needle)
        .or_else(|| options.iter().find(|o| o.text.trim().to_lowercase() == needle))
        .or_else(|| {
            options
                .iter()
                .find(|o| o.text.to_lowercase().contains(&needle) && !needle.is_empty())
        })
}

async fn open_gesture(dom: &dyn DomPort, node: NodeId) -> Result<(), ExecError> {
    dom.dispatch(node, DomEvent::Focus).await?;
    dom.dispatch(node, DomEvent::PointerDown).await?;
    dom.dispatch(node, DomEvent::PointerUp).await?;
    dom.dispatch(node, DomEvent::Click).await?;
    Ok(())
}

async fn commit(dom: &dyn DomPort, node: NodeId, value: &str) -> Result<(), ExecError> {
    dom.set_value(node, value).await?;
    dom.dispatch(node, DomEvent::Change).await?;
    dom.dispatch(node, DomEvent::Blur).await?;
    Ok(())
}

async fn verified(dom: &dyn DomPort, node: NodeId, value: &str) -> Result<bool, ExecError> {
    Ok(dom.describe(node).await?.value == value)
}

/// Some form builders keep the submitted value in a hidden input beside the
/// visible widget. Writing it directly keeps serialization honest.
async fn sync_hidden_mirrors(
    dom: &dyn DomPort,
    snap: &NodeSnapshot,
    value: &str,
) -> Result<usize, ExecError> {
    let Some(name) = snap.name.as_deref().filter(|n| !n.is_empty()) else {
        return Ok(0);
    };
    let mut synced = 0;
    for sibling in dom.by_name(name).await? {
        let mirror = dom.describe(sibling).await?;
        if mirror.type_is("hidden") {
            dom.set_value(sibling, value).await?;
            dom.dispatch(sibling, DomEvent::Input).await?;
            dom.dispatch(sibling, DomEvent::Change).await?;
            synced += 1;
        }
    }
    Ok(synced)
}

fn display_text(option: &OptionState) -> String {
    if option.text.trim().is_empty() {
        option.value.clone()
    } else {
        option.text.trim().to_string()
    }
}
