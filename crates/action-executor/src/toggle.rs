//! Checkbox and radio state changes.

use dom_bridge::{DomEvent, DomPort, NodeId};

use crate::errors::ExecError;
use crate::executor::Applied;

pub(crate) async fn set_checked(
    dom: &dyn DomPort,
    node: NodeId,
    checked: bool,
) -> Result<Applied, ExecError> {
    dom.set_checked(node, checked).await?;
    dom.dispatch(node, DomEvent::Change).await?;
    Ok(Applied::with_value(if checked { "checked" } else { "unchecked" }))
}

pub(crate) async fn pick_radio(dom: &dyn DomPort, node: NodeId) -> Result<(), ExecError> {
    dom.set_checked(node, true).await?;
    dom.dispatch(node, DomEvent::Change).await?;
    Ok(())
}
