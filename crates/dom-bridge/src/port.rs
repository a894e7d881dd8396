use async_trait::async_trait;

use crate::errors::DomError;
use crate::model::{DomEvent, FilePayload, NodeId, NodeSnapshot};

/// The only surface through which the engine reads or mutates the live
/// document. Every method takes handles issued against the current render
/// pass; stale handles fail with [`DomError::StaleNode`] rather than acting
/// on a detached node.
#[async_trait]
pub trait DomPort: Send + Sync {
    /// All interactive controls, in document order.
    async fn controls(&self) -> Result<Vec<NodeId>, DomError>;

    async fn describe(&self, node: NodeId) -> Result<NodeSnapshot, DomError>;

    async fn by_dom_id(&self, id: &str) -> Result<Option<NodeId>, DomError>;

    async fn by_name(&self, name: &str) -> Result<Vec<NodeId>, DomError>;

    /// First control associated with a label whose trimmed text equals the
    /// given text, either via `for=` or by containment.
    async fn by_label_text(&self, label: &str) -> Result<Option<NodeId>, DomError>;

    /// Heading/paragraph text of the main content region.
    async fn page_text(&self) -> Result<String, DomError>;

    /// Assign a value through the host's native setter, bypassing property
    /// overrides installed by UI frameworks.
    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError>;

    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), DomError>;

    async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), DomError>;

    /// Native activation of the control.
    async fn click(&self, node: NodeId) -> Result<(), DomError>;

    /// Bind a file to a file control via a synthetic transfer.
    async fn attach_files(&self, node: NodeId, file: &FilePayload) -> Result<(), DomError>;

    /// Direct property override of the control's file list; fallback when
    /// the synthetic transfer is refused.
    async fn override_file_list(&self, node: NodeId, file: &FilePayload) -> Result<(), DomError>;

    /// Cosmetic only; failures are ignored by callers.
    async fn highlight(&self, node: NodeId) -> Result<(), DomError>;

    async fn clear_highlight(&self, node: NodeId) -> Result<(), DomError>;

    async fn scroll_into_view(&self, node: NodeId) -> Result<(), DomError>;
}
