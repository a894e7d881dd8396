//! In-memory document used by the CLI and by tests across the workspace.
//!
//! A fixture behaves like a hostile host page on demand: `rerender`
//! invalidates every outstanding handle, per-control policies refuse
//! synthetic file transfers or silently swallow value commits the way a
//! framework-controlled select does.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DomError;
use crate::model::{ControlTag, DomEvent, FilePayload, NodeId, NodeSnapshot, OptionState};
use crate::port::DomPort;

/// Declarative description of one fixture control plus its misbehavior
/// policies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub tag: ControlTag,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub dom_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub options: Vec<OptionState>,
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub explicit_label: Option<String>,
    #[serde(default)]
    pub wrapping_label: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub fieldset_legend: Option<String>,
    #[serde(default)]
    pub heading_sibling: Option<String>,
    #[serde(default)]
    pub preceding_text: Option<String>,
    #[serde(default)]
    pub container_hint: Option<String>,
    /// Refuse the synthetic file transfer (force the override path).
    #[serde(default)]
    pub refuse_attach: bool,
    /// Refuse the file-list property override too (force manual fallback).
    #[serde(default)]
    pub refuse_override: bool,
    /// Swallow this many value commits before accepting one, simulating a
    /// framework re-asserting its own state.
    #[serde(default)]
    pub decline_commits: u32,
}

fn default_true() -> bool {
    true
}

impl Default for ControlSpec {
    fn default() -> Self {
        Self {
            tag: ControlTag::Input,
            input_type: None,
            dom_id: None,
            name: None,
            placeholder: None,
            required: false,
            disabled: false,
            visible: true,
            value: String::new(),
            checked: false,
            options: Vec::new(),
            accept: None,
            text: None,
            explicit_label: None,
            wrapping_label: None,
            aria_label: None,
            fieldset_legend: None,
            heading_sibling: None,
            preceding_text: None,
            container_hint: None,
            refuse_attach: false,
            refuse_override: false,
            decline_commits: 0,
        }
    }
}

impl ControlSpec {
    pub fn text(dom_id: &str) -> Self {
        Self {
            tag: ControlTag::Input,
            input_type: Some("text".into()),
            dom_id: Some(dom_id.into()),
            ..Default::default()
        }
    }

    pub fn email(dom_id: &str) -> Self {
        Self {
            input_type: Some("email".into()),
            ..Self::text(dom_id)
        }
    }

    pub fn textarea(dom_id: &str) -> Self {
        Self {
            tag: ControlTag::Textarea,
            input_type: None,
            ..Self::text(dom_id)
        }
    }

    pub fn select(dom_id: &str, options: &[(&str, &str)]) -> Self {
        Self {
            tag: ControlTag::Select,
            input_type: None,
            options: options
                .iter()
                .map(|(value, text)| OptionState {
                    value: (*value).into(),
                    text: (*text).into(),
                    selected: false,
                })
                .collect(),
            ..Self::text(dom_id)
        }
    }

    pub fn checkbox(dom_id: &str) -> Self {
        Self {
            input_type: Some("checkbox".into()),
            ..Self::text(dom_id)
        }
    }

    pub fn radio(name: &str, value: &str) -> Self {
        Self {
            tag: ControlTag::Input,
            input_type: Some("radio".into()),
            name: Some(name.into()),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn file(dom_id: &str) -> Self {
        Self {
            input_type: Some("file".into()),
            ..Self::text(dom_id)
        }
    }

    pub fn hidden_input(name: &str) -> Self {
        Self {
            tag: ControlTag::Input,
            input_type: Some("hidden".into()),
            name: Some(name.into()),
            visible: false,
            ..Default::default()
        }
    }

    pub fn button(text: &str) -> Self {
        Self {
            tag: ControlTag::Button,
            input_type: None,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn submit(text: &str) -> Self {
        Self {
            tag: ControlTag::Input,
            input_type: Some("submit".into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_dom_id(mut self, id: &str) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    pub fn without_dom_id(mut self) -> Self {
        self.dom_id = None;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.explicit_label = Some(label.into());
        self
    }

    pub fn wrapped_label(mut self, label: &str) -> Self {
        self.wrapping_label = Some(label.into());
        self
    }

    pub fn aria(mut self, label: &str) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn legend(mut self, text: &str) -> Self {
        self.fieldset_legend = Some(text.into());
        self
    }

    pub fn heading(mut self, text: &str) -> Self {
        self.heading_sibling = Some(text.into());
        self
    }

    pub fn preceding(mut self, text: &str) -> Self {
        self.preceding_text = Some(text.into());
        self
    }

    pub fn container(mut self, hint: &str) -> Self {
        self.container_hint = Some(hint.into());
        self
    }

    pub fn accepting(mut self, accept: &str) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn valued(mut self, value: &str) -> Self {
        self.value = value.into();
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn refusing_attach(mut self) -> Self {
        self.refuse_attach = true;
        self
    }

    pub fn refusing_override(mut self) -> Self {
        self.refuse_override = true;
        self
    }

    pub fn declining_commits(mut self, count: u32) -> Self {
        self.decline_commits = count;
        self
    }
}

/// On-disk fixture document (the CLI's page format).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureDoc {
    #[serde(default)]
    pub page_text: String,
    pub controls: Vec<ControlSpec>,
}

#[derive(Clone, Debug)]
struct ControlState {
    spec: ControlSpec,
    value: String,
    checked: bool,
    options: Vec<OptionState>,
    files: Vec<String>,
    events: Vec<DomEvent>,
    highlighted: bool,
    highlights: u32,
    decline_left: u32,
}

impl ControlState {
    fn new(spec: ControlSpec) -> Self {
        Self {
            value: spec.value.clone(),
            checked: spec.checked,
            options: spec.options.clone(),
            files: Vec::new(),
            events: Vec::new(),
            highlighted: false,
            highlights: 0,
            decline_left: spec.decline_commits,
            spec,
        }
    }
}

struct Inner {
    revision: u32,
    page_text: String,
    controls: Vec<ControlState>,
}

/// Scriptable in-memory document implementing [`DomPort`].
pub struct FixtureDom {
    inner: RwLock<Inner>,
}

impl FixtureDom {
    pub fn new(controls: Vec<ControlSpec>) -> Self {
        Self::from_doc(FixtureDoc {
            page_text: String::new(),
            controls,
        })
    }

    pub fn from_doc(doc: FixtureDoc) -> Self {
        Self {
            inner: RwLock::new(Inner {
                revision: 0,
                page_text: doc.page_text,
                controls: doc.controls.into_iter().map(ControlState::new).collect(),
            }),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_doc(serde_json::from_str(raw)?))
    }

    /// Simulate a framework re-render: every outstanding handle goes stale.
    pub fn rerender(&self) {
        let mut inner = self.inner.write();
        inner.revision += 1;
        debug!(revision = inner.revision, "fixture re-rendered");
    }

    /// Test hook: overwrite a control's value behind the engine's back,
    /// as a page re-render that discards user input would.
    pub fn set_value_raw(&self, index: usize, value: &str) {
        let mut inner = self.inner.write();
        if let Some(ctl) = inner.controls.get_mut(index) {
            ctl.value = value.to_string();
            for opt in &mut ctl.options {
                opt.selected = opt.value == value;
            }
        }
    }

    pub fn events_at(&self, index: usize) -> Vec<DomEvent> {
        self.inner
            .read()
            .controls
            .get(index)
            .map(|c| c.events.clone())
            .unwrap_or_default()
    }

    pub fn value_at(&self, index: usize) -> String {
        self.inner
            .read()
            .controls
            .get(index)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    pub fn checked_at(&self, index: usize) -> bool {
        self.inner
            .read()
            .controls
            .get(index)
            .map(|c| c.checked)
            .unwrap_or_default()
    }

    pub fn files_at(&self, index: usize) -> Vec<String> {
        self.inner
            .read()
            .controls
            .get(index)
            .map(|c| c.files.clone())
            .unwrap_or_default()
    }

    pub fn highlighted_at(&self, index: usize) -> bool {
        self.inner
            .read()
            .controls
            .get(index)
            .map(|c| c.highlighted)
            .unwrap_or_default()
    }

    /// How many times the control has been highlighted, including
    /// highlights since cleared.
    pub fn highlight_count_at(&self, index: usize) -> u32 {
        self.inner
            .read()
            .controls
            .get(index)
            .map(|c| c.highlights)
            .unwrap_or_default()
    }

    fn check_handle(inner: &Inner, node: NodeId) -> Result<usize, DomError> {
        if node.revision() != inner.revision {
            return Err(DomError::StaleNode);
        }
        let index = node.index();
        if index >= inner.controls.len() {
            return Err(DomError::NoSuchNode);
        }
        Ok(index)
    }

    fn snapshot_of(inner: &Inner, index: usize) -> NodeSnapshot {
        let ctl = &inner.controls[index];
        let spec = &ctl.spec;
        NodeSnapshot {
            ordinal: index,
            tag: spec.tag,
            input_type: spec.input_type.clone(),
            dom_id: spec.dom_id.clone(),
            name: spec.name.clone(),
            placeholder: spec.placeholder.clone(),
            required: spec.required,
            disabled: spec.disabled,
            visible: spec.visible,
            value: ctl.value.clone(),
            checked: ctl.checked,
            options: ctl.options.clone(),
            accept: spec.accept.clone(),
            files: ctl.files.clone(),
            text: spec.text.clone(),
            explicit_label: spec.explicit_label.clone(),
            wrapping_label: spec.wrapping_label.clone(),
            aria_label: spec.aria_label.clone(),
            fieldset_legend: spec.fieldset_legend.clone(),
            heading_sibling: spec.heading_sibling.clone(),
            preceding_text: spec.preceding_text.clone(),
            container_hint: spec.container_hint.clone(),
        }
    }
}

#[async_trait]
impl DomPort for FixtureDom {
    async fn controls(&self) -> Result<Vec<NodeId>, DomError> {
        let inner = self.inner.read();
        Ok((0..inner.controls.len())
            .map(|i| NodeId::new(inner.revision, i))
            .collect())
    }

    async fn describe(&self, node: NodeId) -> Result<NodeSnapshot, DomError> {
        let inner = self.inner.read();
        let index = Self::check_handle(&inner, node)?;
        Ok(Self::snapshot_of(&inner, index))
    }

    async fn by_dom_id(&self, id: &str) -> Result<Option<NodeId>, DomError> {
        let inner = self.inner.read();
        Ok(inner
            .controls
            .iter()
            .position(|c| c.spec.dom_id.as_deref() == Some(id))
            .map(|i| NodeId::new(inner.revision, i)))
    }

    async fn by_name(&self, name: &str) -> Result<Vec<NodeId>, DomError> {
        let inner = self.inner.read();
        Ok(inner
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.spec.name.as_deref() == Some(name))
            .map(|(i, _)| NodeId::new(inner.revision, i))
            .collect())
    }

    async fn by_label_text(&self, label: &str) -> Result<Option<NodeId>, DomError> {
        let wanted = label.trim();
        let inner = self.inner.read();
        Ok(inner
            .controls
            .iter()
            .position(|c| {
                c.spec
                    .explicit_label
                    .as_deref()
                    .is_some_and(|l| l.trim() == wanted)
                    || c.spec
                        .wrapping_label
                        .as_deref()
                        .is_some_and(|l| l.trim() == wanted)
            })
            .map(|i| NodeId::new(inner.revision, i)))
    }

    async fn page_text(&self) -> Result<String, DomError> {
        Ok(self.inner.read().page_text.clone())
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        let ctl = &mut inner.controls[index];
        if ctl.decline_left > 0 {
            ctl.decline_left -= 1;
            debug!(%node, remaining = ctl.decline_left, "fixture declined value commit");
            return Ok(());
        }
        if ctl.spec.tag == ControlTag::Select {
            // Native select semantics: an unmatched value clears selection.
            let matched = ctl.options.iter().any(|o| o.value == value);
            for opt in &mut ctl.options {
                opt.selected = matched && opt.value == value;
            }
            ctl.value = if matched { value.to_string() } else { String::new() };
        } else {
            ctl.value = value.to_string();
        }
        Ok(())
    }

    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        let group = inner.controls[index].spec.name.clone();
        let is_radio = inner.controls[index]
            .spec
            .input_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("radio"));
        if is_radio && checked {
            if let Some(group) = group {
                for (i, ctl) in inner.controls.iter_mut().enumerate() {
                    if i != index && ctl.spec.name.as_deref() == Some(group.as_str()) {
                        ctl.checked = false;
                    }
                }
            }
        }
        inner.controls[index].checked = checked;
        Ok(())
    }

    async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        inner.controls[index].events.push(event);
        Ok(())
    }

    async fn click(&self, node: NodeId) -> Result<(), DomError> {
        self.dispatch(node, DomEvent::Click).await
    }

    async fn attach_files(&self, node: NodeId, file: &FilePayload) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        let ctl = &mut inner.controls[index];
        if ctl.spec.refuse_attach {
            return Err(DomError::AssignmentRefused(
                "synthetic transfer rejected by host".into(),
            ));
        }
        ctl.files = vec![file.name.clone()];
        Ok(())
    }

    async fn override_file_list(&self, node: NodeId, file: &FilePayload) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        let ctl = &mut inner.controls[index];
        if ctl.spec.refuse_override {
            return Err(DomError::AssignmentRefused(
                "file list property is read-only".into(),
            ));
        }
        ctl.files = vec![file.name.clone()];
        Ok(())
    }

    async fn highlight(&self, node: NodeId) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        inner.controls[index].highlighted = true;
        inner.controls[index].highlights += 1;
        Ok(())
    }

    async fn clear_highlight(&self, node: NodeId) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let index = Self::check_handle(&inner, node)?;
        inner.controls[index].highlighted = false;
        Ok(())
    }

    async fn scroll_into_view(&self, _node: NodeId) -> Result<(), DomError> {
        Ok(())
    }
}
