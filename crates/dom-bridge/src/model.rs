use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to a live control.
///
/// The upper 32 bits carry the document revision the handle was issued
/// against; any mutation that re-renders the document invalidates every
/// outstanding handle. Consumers re-resolve instead of caching.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(revision: u32, index: usize) -> Self {
        Self(((revision as u64) << 32) | index as u64)
    }

    pub(crate) fn revision(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub(crate) fn index(self) -> usize {
        (self.0 & u32::MAX as u64) as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}@r{}", self.index(), self.revision())
    }
}

/// Tag of a control element.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlTag {
    Input,
    Textarea,
    Select,
    Button,
}

/// Notification dispatched at a control so framework-bound listeners
/// observe programmatic changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DomEvent {
    Focus,
    Blur,
    Input,
    Change,
    PointerDown,
    PointerUp,
    Click,
    KeyDown(String),
}

/// File-like object bound to a decoded binary buffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilePayload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// One option of a select control as currently rendered.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OptionState {
    pub value: String,
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// Point-in-time description of one control.
///
/// Label-bearing fields are pre-resolved text (a CDP-backed port computes
/// them page-side); choosing among them is engine logic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Position in document order, stable across re-renders of an
    /// otherwise unchanged document.
    pub ordinal: usize,
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
    /// Names of files currently held by a file control.
    #[serde(default)]
    pub files: Vec<String>,
    /// Visible text for buttons.
    #[serde(default)]
    pub text: Option<String>,
    /// Text of an explicitly associated `<label for=...>`.
    #[serde(default)]
    pub explicit_label: Option<String>,
    /// Text of a wrapping label ancestor.
    #[serde(default)]
    pub wrapping_label: Option<String>,
    /// aria-label, or resolved aria-labelledby text.
    #[serde(default)]
    pub aria_label: Option<String>,
    /// Legend of the nearest enclosing fieldset.
    #[serde(default)]
    pub fieldset_legend: Option<String>,
    /// Heading-like sibling text preceding the control's container.
    #[serde(default)]
    pub heading_sibling: Option<String>,
    /// Text of a preceding label/div/paragraph sibling.
    #[serde(default)]
    pub preceding_text: Option<String>,
    /// id/class tokens of the nearest container, for keyword discovery.
    #[serde(default)]
    pub container_hint: Option<String>,
}

impl Default for ControlTag {
    fn default() -> Self {
        ControlTag::Input
    }
}

fn default_true() -> bool {
    true
}

impl NodeSnapshot {
    pub fn type_is(&self, ty: &str) -> bool {
        self.input_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(ty))
    }

    pub fn is_file_input(&self) -> bool {
        self.tag == ControlTag::Input && self.type_is("file")
    }

    pub fn is_interactable(&self) -> bool {
        self.visible && !self.disabled
    }
}
