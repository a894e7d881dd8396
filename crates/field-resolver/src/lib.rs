//! Field resolution: maps the stable ids carried by a plan back to live
//! document handles.
//!
//! Handles are never cached across actions. Every action re-resolves its
//! target so a document that re-rendered between steps is picked up on the
//! fresh revision instead of failing on a detached node.

use std::sync::Arc;

use async_trait::async_trait;
use dom_bridge::{DomError, DomPort, NodeId};
use formpilot_core_types::{EngineError, FieldRef, FormSnapshot, RadioChoice, RadioGroup};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Wire-stable message; result panels show it verbatim.
    #[error("Element not found")]
    ElementNotFound,
    #[error("dom error: {0}")]
    Dom(#[from] DomError),
}

impl From<ResolveError> for EngineError {
    fn from(err: ResolveError) -> Self {
        EngineError::new(err.to_string())
    }
}

#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// Resolve a stable id against the document's current revision.
    async fn resolve(
        &self,
        snapshot: &FormSnapshot,
        element_id: &str,
    ) -> Result<NodeId, ResolveError>;

    /// Resolve one option of a radio group.
    async fn resolve_radio(
        &self,
        group: &RadioGroup,
        option: &RadioChoice,
    ) -> Result<NodeId, ResolveError>;
}

/// Resolver backed directly by the document: id attribute first, then
/// name, then associated label text.
pub struct DefaultFieldResolver {
    dom: Arc<dyn DomPort>,
}

impl DefaultFieldResolver {
    pub fn new(dom: Arc<dyn DomPort>) -> Self {
        Self { dom }
    }

    async fn by_identity(
        &self,
        dom_id: Option<&str>,
        name: Option<&str>,
        label: Option<&str>,
    ) -> Result<Option<NodeId>, ResolveError> {
        if let Some(id) = dom_id.filter(|s| !s.is_empty()) {
            if let Some(node) = self.dom.by_dom_id(id).await? {
                return Ok(Some(node));
            }
        }
        if let Some(name) = name.filter(|s| !s.is_empty()) {
            if let Some(node) = self.dom.by_name(name).await?.into_iter().next() {
                return Ok(Some(node));
            }
        }
        if let Some(label) = label.filter(|s| !s.is_empty()) {
            if let Some(node) = self.dom.by_label_text(label).await? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl FieldResolver for DefaultFieldResolver {
    #[instrument(skip(self, snapshot))]
    async fn resolve(
        &self,
        snapshot: &FormSnapshot,
        element_id: &str,
    ) -> Result<NodeId, ResolveError> {
        if let Some(field) = snapshot.find(element_id) {
            if let FieldRef::Radio { group, option } = field {
                return self.resolve_radio(group, option).await;
            }
            if let Some(node) = self
                .by_identity(field.dom_id(), field.name(), Some(field.label()))
                .await?
            {
                return Ok(node);
            }
        }
        // The plan may reference a control the snapshot never saw, e.g. one
        // added by a later re-render; fall through to the document itself.
        if let Some(node) = self
            .by_identity(Some(element_id), Some(element_id), Some(element_id))
            .await?
        {
            debug!(element_id, "resolved outside the snapshot");
            return Ok(node);
        }
        Err(ResolveError::ElementNotFound)
    }

    async fn resolve_radio(
        &self,
        group: &RadioGroup,
        option: &RadioChoice,
    ) -> Result<NodeId, ResolveError> {
        if let Some(id) = option.dom_id.as_deref().filter(|s| !s.is_empty()) {
            if let Some(node) = self.dom.by_dom_id(id).await? {
                return Ok(node);
            }
        }
        for node in self.dom.by_name(&group.name).await? {
            let snap = self.dom.describe(node).await?;
            if snap.type_is("radio") && snap.value == option.value {
                return Ok(node);
            }
        }
        Err(ResolveError::ElementNotFound)
    }
}
