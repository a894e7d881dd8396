//! Shared primitives for the FormPilot autofill engine crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type carried across crate boundaries.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("{message}")]
    Message { message: String },
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Category of a detected form control.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Checkbox,
    RadioGroup,
    File,
    Button,
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Text
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
            FieldKind::RadioGroup => "radio-group",
            FieldKind::File => "file",
            FieldKind::Button => "button",
        };
        f.write_str(name)
    }
}

/// One `<option>` entry of a select control.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelectChoice {
    pub value: String,
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// Immutable description of one detected control.
///
/// `id` is the stable identifier handed to the decision-maker: explicit dom
/// id, else the `name` attribute, else a synthesized ordinal. No live handle
/// is ever stored; execution re-resolves through the resolver on every use.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub id: String,
    #[serde(default)]
    pub dom_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub options: Vec<SelectChoice>,
    #[serde(default)]
    pub accept: Option<String>,
    /// Visible text for buttons.
    #[serde(default)]
    pub text: Option<String>,
}

/// One option of a radio group.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RadioChoice {
    pub id: String,
    #[serde(default)]
    pub dom_id: Option<String>,
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub checked: bool,
}

/// Radio controls grouped by shared `name`; emptiness and required-ness are
/// meaningful only at group level.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RadioGroup {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    pub options: Vec<RadioChoice>,
}

/// Immutable snapshot of everything one detection pass found.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub text_inputs: Vec<FieldRecord>,
    pub textareas: Vec<FieldRecord>,
    pub selects: Vec<FieldRecord>,
    pub checkboxes: Vec<FieldRecord>,
    pub radio_groups: Vec<RadioGroup>,
    pub file_inputs: Vec<FieldRecord>,
    pub buttons: Vec<FieldRecord>,
    #[serde(default)]
    pub page_text: String,
}

/// Borrowed view of a field looked up by stable id.
#[derive(Clone, Copy, Debug)]
pub enum FieldRef<'a> {
    Field(&'a FieldRecord),
    Radio {
        group: &'a RadioGroup,
        option: &'a RadioChoice,
    },
}

impl<'a> FieldRef<'a> {
    pub fn dom_id(&self) -> Option<&'a str> {
        match self {
            FieldRef::Field(rec) => rec.dom_id.as_deref(),
            FieldRef::Radio { option, .. } => option.dom_id.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match self {
            FieldRef::Field(rec) => rec.name.as_deref(),
            FieldRef::Radio { group, .. } => Some(group.name.as_str()),
        }
    }

    pub fn label(&self) -> &'a str {
        match self {
            FieldRef::Field(rec) => rec.label.as_str(),
            FieldRef::Radio { option, .. } => option.label.as_str(),
        }
    }

    pub fn required(&self) -> bool {
        match self {
            FieldRef::Field(rec) => rec.required,
            FieldRef::Radio { group, .. } => group.required,
        }
    }

    /// Value a radio option commits when selected.
    pub fn radio_value(&self) -> Option<&'a str> {
        match self {
            FieldRef::Radio { option, .. } => Some(option.value.as_str()),
            FieldRef::Field(_) => None,
        }
    }
}

impl FormSnapshot {
    fn field_collections(&self) -> [&Vec<FieldRecord>; 6] {
        [
            &self.text_inputs,
            &self.textareas,
            &self.selects,
            &self.checkboxes,
            &self.file_inputs,
            &self.buttons,
        ]
    }

    /// Look a field up by its stable id, searching every collection and
    /// falling back to radio options.
    pub fn find(&self, id: &str) -> Option<FieldRef<'_>> {
        for coll in self.field_collections() {
            if let Some(rec) = coll.iter().find(|rec| rec.id == id) {
                return Some(FieldRef::Field(rec));
            }
        }
        for group in &self.radio_groups {
            if let Some(option) = group.options.iter().find(|opt| opt.id == id) {
                return Some(FieldRef::Radio { group, option });
            }
        }
        None
    }

    /// Human-readable label for a field id, used in progress messages and
    /// result rows. Falls back to the id itself when nothing better exists.
    pub fn display_label(&self, id: &str) -> String {
        match self.find(id) {
            Some(FieldRef::Field(rec)) => {
                if !rec.label.is_empty() {
                    rec.label.clone()
                } else if let Some(ph) = rec.placeholder.as_deref().filter(|p| !p.is_empty()) {
                    ph.to_string()
                } else {
                    rec.name.clone().unwrap_or_else(|| id.to_string())
                }
            }
            Some(FieldRef::Radio { group, option }) => {
                if !option.label.is_empty() {
                    option.label.clone()
                } else {
                    group.label.clone()
                }
            }
            None => id.to_string(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_collections().iter().map(|c| c.len()).sum::<usize>()
            + self
                .radio_groups
                .iter()
                .map(|g| g.options.len())
                .sum::<usize>()
    }
}

/// Closed set of action types the executor dispatches on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fill,
    Select,
    Check,
    Radio,
    Upload,
    Click,
}

impl ActionKind {
    /// Parse the wire name of an action; unknown names are rejected at plan
    /// parse time and surfaced as per-field errors.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fill" => Some(ActionKind::Fill),
            "select" => Some(ActionKind::Select),
            "check" => Some(ActionKind::Check),
            "radio" => Some(ActionKind::Radio),
            "upload" => Some(ActionKind::Upload),
            "click" => Some(ActionKind::Click),
            _ => None,
        }
    }

    /// `click` is the only action that carries no value.
    pub fn requires_value(&self) -> bool {
        !matches!(self, ActionKind::Click)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Fill => "fill",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
            ActionKind::Radio => "radio",
            ActionKind::Upload => "upload",
            ActionKind::Click => "click",
        };
        f.write_str(name)
    }
}

/// One externally planned assignment for one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub element_id: String,
    pub kind: ActionKind,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub explanation: String,
}

impl ActionItem {
    /// Coerce the planned value into the string committed to the page.
    pub fn value_as_str(&self) -> Option<String> {
        match self.value.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Interpretation of the value for check actions.
    pub fn value_as_bool(&self) -> bool {
        match self.value.as_ref() {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// A plan item whose action type was not recognized; recorded as a per-field
/// error without aborting the queue.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RejectedAction {
    pub element_id: String,
    pub reason: String,
}

/// Cover-letter content supplied by the decision-maker for upload actions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterSpec {
    pub content: String,
    pub filename: String,
}

/// Parsed, validated action plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub actions: Vec<ActionItem>,
    #[serde(default)]
    pub rejected: Vec<RejectedAction>,
    #[serde(default)]
    pub submit_form: bool,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub cover_letter: Option<CoverLetterSpec>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Success,
    Error,
}

/// Per-field outcome; at most one entry per element id per session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub status: FieldStatus,
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FieldResult {
    pub fn success(label: impl Into<String>, value: Option<String>) -> Self {
        Self {
            status: FieldStatus::Success,
            label: label.into(),
            value,
            error: None,
        }
    }

    pub fn error(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Error,
            label: label.into(),
            value: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FieldStatus::Success
    }
}

/// Ordered, deterministic result map keyed by stable element id.
pub type FieldResults = BTreeMap<String, FieldResult>;

/// Session phase machine; `Error` is reachable from planning or executing
/// without discarding already-collected results.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Detecting,
    Planning,
    Executing,
    Submitting,
    Complete,
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Detecting => "detecting",
            SessionPhase::Planning => "planning",
            SessionPhase::Executing => "executing",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Complete => "complete",
            SessionPhase::Error => "error",
        };
        f.write_str(name)
    }
}

/// One completed action, kept as session history and handed back to the
/// planner on subsequent runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(default)]
    pub id: ActionId,
    pub step: u32,
    pub kind: ActionKind,
    pub element_id: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_email() -> FormSnapshot {
        FormSnapshot {
            text_inputs: vec![FieldRecord {
                id: "email".into(),
                dom_id: Some("email".into()),
                name: Some("email".into()),
                kind: FieldKind::Text,
                label: "Email".into(),
                required: true,
                ..Default::default()
            }],
            radio_groups: vec![RadioGroup {
                name: "visa".into(),
                label: "Visa status".into(),
                required: true,
                options: vec![RadioChoice {
                    id: "visa-yes".into(),
                    dom_id: None,
                    value: "yes".into(),
                    label: "Yes".into(),
                    checked: false,
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn find_searches_all_collections() {
        let snap = snapshot_with_email();
        assert!(matches!(snap.find("email"), Some(FieldRef::Field(_))));
        match snap.find("visa-yes") {
            Some(FieldRef::Radio { group, option }) => {
                assert_eq!(group.name, "visa");
                assert_eq!(option.value, "yes");
            }
            other => panic!("unexpected lookup result: {other:?}"),
        }
        assert!(snap.find("missing").is_none());
    }

    #[test]
    fn display_label_falls_back_to_id() {
        let snap = snapshot_with_email();
        assert_eq!(snap.display_label("email"), "Email");
        assert_eq!(snap.display_label("unknown-field"), "unknown-field");
    }

    #[test]
    fn action_kind_parse_is_case_insensitive() {
        assert_eq!(ActionKind::parse("Fill"), Some(ActionKind::Fill));
        assert_eq!(ActionKind::parse(" upload "), Some(ActionKind::Upload));
        assert_eq!(ActionKind::parse("hover"), None);
    }

    #[test]
    fn click_does_not_require_value() {
        assert!(!ActionKind::Click.requires_value());
        assert!(ActionKind::Fill.requires_value());
    }

    #[test]
    fn value_coercions() {
        let item = ActionItem {
            element_id: "age".into(),
            kind: ActionKind::Fill,
            value: Some(serde_json::json!(42)),
            explanation: String::new(),
        };
        assert_eq!(item.value_as_str().as_deref(), Some("42"));

        let checked = ActionItem {
            element_id: "tos".into(),
            kind: ActionKind::Check,
            value: Some(serde_json::json!("true")),
            explanation: String::new(),
        };
        assert!(checked.value_as_bool());
    }
}
