use std::sync::Arc;

use dom_bridge::{DomPort, NodeId};
use field_resolver::FieldResolver;
use formpilot_core_types::{
    ActionItem, ActionKind, CoverLetterSpec, FieldRef, FormSnapshot, RadioChoice, RadioGroup,
};
use tracing::{debug, instrument};

use crate::errors::ExecError;
use crate::ports::AttachmentPort;
use crate::tempo::Tempo;
use crate::{click, fill, select, toggle, upload};

/// Everything one action needs from the surrounding plan.
pub struct PlanContext<'a> {
    pub snapshot: &'a FormSnapshot,
    pub cover_letter: Option<&'a CoverLetterSpec>,
}

/// Outcome of one applied action.
#[derive(Clone, Debug, Default)]
pub struct Applied {
    /// Value as committed, for the result panel.
    pub value: Option<String>,
    pub warnings: Vec<String>,
}

impl Applied {
    pub(crate) fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Applies one action at a time against the document. Target handles are
/// resolved per action, never cached across them.
pub struct ActionExecutor {
    dom: Arc<dyn DomPort>,
    resolver: Arc<dyn FieldResolver>,
    attachments: Arc<dyn AttachmentPort>,
    tempo: Tempo,
}

impl ActionExecutor {
    pub fn new(
        dom: Arc<dyn DomPort>,
        resolver: Arc<dyn FieldResolver>,
        attachments: Arc<dyn AttachmentPort>,
        tempo: Tempo,
    ) -> Self {
        Self {
            dom,
            resolver,
            attachments,
            tempo,
        }
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    #[instrument(skip(self, ctx, item), fields(element_id = %item.element_id, kind = %item.kind))]
    pub async fn apply(
        &self,
        ctx: &PlanContext<'_>,
        item: &ActionItem,
    ) -> Result<Applied, ExecError> {
        match item.kind {
            ActionKind::Fill => {
                let value = self.required_value(item)?;
                let node = self.resolver.resolve(ctx.snapshot, &item.element_id).await?;
                self.spotlight(node).await;
                let out = fill::run(self.dom.as_ref(), node, &value).await;
                self.clear_spotlight(node).await;
                out
            }
            ActionKind::Select => {
                let value = self.required_value(item)?;
                let node = self.resolver.resolve(ctx.snapshot, &item.element_id).await?;
                self.spotlight(node).await;
                let out = select::run(self.dom.as_ref(), &self.tempo, node, &value).await;
                self.clear_spotlight(node).await;
                out
            }
            ActionKind::Check => {
                self.required_value(item)?;
                let checked = item.value_as_bool();
                let node = self.resolver.resolve(ctx.snapshot, &item.element_id).await?;
                self.spotlight(node).await;
                let out = toggle::set_checked(self.dom.as_ref(), node, checked).await;
                self.clear_spotlight(node).await;
                out
            }
            ActionKind::Radio => {
                let value = self.required_value(item)?;
                let (group, option) = radio_target(ctx.snapshot, &item.element_id, &value)
                    .ok_or(ExecError::ElementNotFound)?;
                let node = self.resolver.resolve_radio(group, option).await?;
                self.spotlight(node).await;
                let out = toggle::pick_radio(self.dom.as_ref(), node).await;
                self.clear_spotlight(node).await;
                out?;
                debug!(group = %group.name, option = %option.value, "radio selected");
                Ok(Applied::with_value(option.label.clone()))
            }
            ActionKind::Upload => {
                let value = self.required_value(item)?;
                upload::run(
                    self.dom.as_ref(),
                    self.resolver.as_ref(),
                    self.attachments.as_ref(),
                    &self.tempo,
                    ctx.snapshot,
                    &item.element_id,
                    &value,
                    ctx.cover_letter,
                )
                .await
            }
            ActionKind::Click => {
                let node = self.resolver.resolve(ctx.snapshot, &item.element_id).await?;
                self.spotlight(node).await;
                let out = click::run(self.dom.as_ref(), node).await;
                self.clear_spotlight(node).await;
                out
            }
        }
    }

    fn required_value(&self, item: &ActionItem) -> Result<String, ExecError> {
        item.value_as_str()
            .ok_or_else(|| ExecError::MissingValue(item.element_id.clone()))
    }

    /// Cosmetic; failures here never fail the action.
    async fn spotlight(&self, node: NodeId) {
        let _ = self.dom.scroll_into_view(node).await;
        let _ = self.dom.highlight(node).await;
        self.tempo.pause(self.tempo.highlight_hold).await;
    }

    async fn clear_spotlight(&self, node: NodeId) {
        let _ = self.dom.clear_highlight(node).await;
    }
}

/// Locate the radio group and the option the value names. The plan may
/// address the group by name or any of its options by stable id.
fn radio_target<'a>(
    snapshot: &'a FormSnapshot,
    element_id: &str,
    wanted: &str,
) -> Option<(&'a RadioGroup, &'a RadioChoice)> {
    let (group, named_option) = match snapshot
        .radio_groups
        .iter()
        .find(|g| g.name == element_id)
    {
        Some(group) => (group, None),
        None => match snapshot.find(element_id)? {
            FieldRef::Radio { group, option } => (group, Some(option)),
            FieldRef::Field(_) => return None,
        },
    };
    let needle = wanted.trim().to_lowercase();
    let by_value = group
        .options
        .iter()
        .find(|o| o.value.to_lowercase() == needle)
        .or_else(|| group.options.iter().find(|o| o.label.to_lowercase() == needle));
    by_value.or(named_option).map(|option| (group, option))
}
