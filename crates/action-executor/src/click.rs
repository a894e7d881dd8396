//! Button activation.

use dom_bridge::{DomPort, NodeId};

use crate::errors::ExecError;
use crate::executor::Applied;

pub(crate) async fn run(dom: &dyn DomPort, node: NodeId) -> Result<Applied, ExecError> {
    dom.click(node).await?;
    Ok(Applied::with_value("clicked"))
}
