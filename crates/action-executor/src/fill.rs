//! Text entry: value through the native setter, then the notification pair
//! frameworks listen for.

use dom_bridge::{DomEvent, DomPort, NodeId};

use crate::errors::ExecError;
use crate::executor::Applied;

pub(crate) async fn run(dom: &dyn DomPort, node: NodeId, value: &str) -> Result<Applied, ExecError> {
    dom.dispatch(node, DomEvent::Focus).await?;
    dom.set_value(node, value).await?;
    dom.dispatch(node, DomEvent::Input).await?;
    dom.dispatch(node, DomEvent::Change).await?;
    Ok(Applied::with_value(value))
}
