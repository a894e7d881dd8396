use dom_bridge::{ControlTag, DomPort, NodeSnapshot};
use formpilot_core_types::{
    FieldKind, FieldRecord, FormSnapshot, RadioChoice, RadioGroup, SelectChoice,
};
use tracing::{debug, instrument};

use crate::errors::InventoryError;
use crate::labels;

/// Input types treated as free-text entry.
const TEXT_TYPES: &[&str] = &["text", "email", "tel", "url", "password", "search", "number"];

/// Page text beyond this length adds nothing for planning.
const PAGE_TEXT_LIMIT: usize = 5_000;

/// Scans a document into a [`FormSnapshot`].
pub struct InventoryBuilder<'a> {
    dom: &'a dyn DomPort,
}

impl<'a> InventoryBuilder<'a> {
    pub fn new(dom: &'a dyn DomPort) -> Self {
        Self { dom }
    }

    #[instrument(skip(self))]
    pub async fn scan(&self) -> Result<FormSnapshot, InventoryError> {
        let mut snapshot = FormSnapshot {
            page_text: truncate(self.dom.page_text().await?, PAGE_TEXT_LIMIT),
            ..Default::default()
        };

        for node in self.dom.controls().await? {
            let snap = self.dom.describe(node).await?;
            if snap.type_is("hidden") {
                continue;
            }
            // Job boards routinely hide the real file input behind a styled
            // button, so file inputs are inventoried even when invisible.
            if !snap.visible && !snap.is_file_input() {
                continue;
            }
            self.classify(&snap, &mut snapshot);
        }

        debug!(
            text_inputs = snapshot.text_inputs.len(),
            textareas = snapshot.textareas.len(),
            selects = snapshot.selects.len(),
            checkboxes = snapshot.checkboxes.len(),
            radio_groups = snapshot.radio_groups.len(),
            file_inputs = snapshot.file_inputs.len(),
            buttons = snapshot.buttons.len(),
            "inventory scan complete"
        );
        Ok(snapshot)
    }

    fn classify(&self, snap: &NodeSnapshot, out: &mut FormSnapshot) {
        match snap.tag {
            ControlTag::Textarea => {
                let record = field_record(snap, FieldKind::Textarea, "textarea", out.textareas.len());
                out.textareas.push(record);
            }
            ControlTag::Select => {
                let mut record = field_record(snap, FieldKind::Select, "select", out.selects.len());
                record.options = snap
                    .options
                    .iter()
                    .map(|o| SelectChoice {
                        value: o.value.clone(),
                        text: o.text.clone(),
                        selected: o.selected,
                    })
                    .collect();
                out.selects.push(record);
            }
            ControlTag::Button => {
                out.buttons
                    .push(button_record(snap, out.buttons.len()));
            }
            ControlTag::Input => self.classify_input(snap, out),
        }
    }

    fn classify_input(&self, snap: &NodeSnapshot, out: &mut FormSnapshot) {
        if snap.is_file_input() {
            let mut record =
                field_record(snap, FieldKind::File, "file-input", out.file_inputs.len());
            record.accept = snap.accept.clone();
            record.value = snap.files.join(", ");
            out.file_inputs.push(record);
        } else if snap.type_is("checkbox") {
            let record = field_record(snap, FieldKind::Checkbox, "checkbox", out.checkboxes.len());
            out.checkboxes.push(record);
        } else if snap.type_is("radio") {
            self.classify_radio(snap, out);
        } else if snap.type_is("submit") || snap.type_is("button") {
            out.buttons
                .push(button_record(snap, out.buttons.len()));
        } else if snap.input_type.is_none()
            || snap
                .input_type
                .as_deref()
                .is_some_and(|t| TEXT_TYPES.iter().any(|k| t.eq_ignore_ascii_case(k)))
        {
            let record = field_record(snap, FieldKind::Text, "text-input", out.text_inputs.len());
            out.text_inputs.push(record);
        } else {
            debug!(input_type = ?snap.input_type, ordinal = snap.ordinal, "skipping unsupported input type");
        }
    }

    fn classify_radio(&self, snap: &NodeSnapshot, out: &mut FormSnapshot) {
        // A radio without a name belongs to no group and cannot be acted on.
        let Some(name) = snap.name.as_deref().filter(|n| !n.is_empty()) else {
            debug!(ordinal = snap.ordinal, "skipping unnamed radio");
            return;
        };
        let index = match out.radio_groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                out.radio_groups.push(RadioGroup {
                    name: name.to_string(),
                    label: labels::group_label(snap),
                    required: false,
                    options: Vec::new(),
                });
                out.radio_groups.len() - 1
            }
        };
        let group = &mut out.radio_groups[index];
        group.required |= snap.required;
        let option_index = group.options.len();
        group.options.push(RadioChoice {
            id: snap
                .dom_id
                .clone()
                .unwrap_or_else(|| format!("radio-{name}-{option_index}")),
            dom_id: snap.dom_id.clone(),
            value: snap.value.clone(),
            label: labels::option_label(snap),
            checked: snap.checked,
        });
    }
}

fn stable_id(snap: &NodeSnapshot, prefix: &str, position: usize) -> String {
    snap.dom_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| snap.name.clone().filter(|n| !n.is_empty()))
        .unwrap_or_else(|| format!("{prefix}-{position}"))
}

fn field_record(snap: &NodeSnapshot, kind: FieldKind, prefix: &str, position: usize) -> FieldRecord {
    FieldRecord {
        id: stable_id(snap, prefix, position),
        dom_id: snap.dom_id.clone(),
        name: snap.name.clone(),
        kind,
        label: labels::field_label(snap),
        placeholder: snap.placeholder.clone(),
        required: snap.required,
        value: snap.value.clone(),
        checked: snap.checked,
        options: Vec::new(),
        accept: None,
        text: None,
    }
}

fn button_record(snap: &NodeSnapshot, position: usize) -> FieldRecord {
    let text = snap
        .text
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| snap.value.clone());
    let mut record = field_record(snap, FieldKind::Button, "button", position);
    if record.label == "Button" || record.label == "Form Field" {
        record.label = if text.trim().is_empty() {
            "Button".to_string()
        } else {
            text.trim().to_string()
        };
    }
    record.text = Some(text);
    record
}

fn truncate(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_bridge::{ControlSpec, FixtureDom};

    fn fixture() -> FixtureDom {
        FixtureDom::new(vec![
            ControlSpec::email("email").labeled("Email address").required(),
            ControlSpec::text("first_name").named("first_name"),
            ControlSpec::textarea("cover").named("cover_letter"),
            ControlSpec::select("country", &[("US", "United States"), ("CA", "Canada")]),
            ControlSpec::checkbox("terms").wrapped_label("I agree to the terms"),
            ControlSpec::radio("visa", "yes")
                .legend("Work authorization")
                .wrapped_label("Yes")
                .required(),
            ControlSpec::radio("visa", "no").wrapped_label("No"),
            ControlSpec::radio("orphan", "x").named(""),
            ControlSpec::file("resume").accepting(".pdf,.doc").hidden(),
            ControlSpec::submit("Submit Application"),
            ControlSpec::hidden_input("csrf_token"),
        ])
    }

    #[tokio::test]
    async fn scan_classifies_every_kind() {
        let dom = fixture();
        let snapshot = InventoryBuilder::new(&dom).scan().await.unwrap();

        assert_eq!(snapshot.text_inputs.len(), 2);
        assert_eq!(snapshot.textareas.len(), 1);
        assert_eq!(snapshot.selects.len(), 1);
        assert_eq!(snapshot.checkboxes.len(), 1);
        assert_eq!(snapshot.radio_groups.len(), 1);
        assert_eq!(snapshot.file_inputs.len(), 1);
        assert_eq!(snapshot.buttons.len(), 1);

        let email = &snapshot.text_inputs[0];
        assert_eq!(email.id, "email");
        assert_eq!(email.label, "Email address");
        assert!(email.required);

        let select = &snapshot.selects[0];
        assert_eq!(select.options.len(), 2);
        assert_eq!(select.options[1].text, "Canada");
    }

    #[tokio::test]
    async fn radio_options_group_by_name() {
        let dom = fixture();
        let snapshot = InventoryBuilder::new(&dom).scan().await.unwrap();

        let group = &snapshot.radio_groups[0];
        assert_eq!(group.name, "visa");
        assert_eq!(group.label, "Work authorization");
        assert!(group.required);
        assert_eq!(group.options.len(), 2);
        assert_eq!(group.options[0].value, "yes");
        assert_eq!(group.options[0].label, "Yes");
    }

    #[tokio::test]
    async fn hidden_file_input_is_inventoried() {
        let dom = fixture();
        let snapshot = InventoryBuilder::new(&dom).scan().await.unwrap();
        assert_eq!(snapshot.file_inputs[0].id, "resume");
        assert_eq!(snapshot.file_inputs[0].accept.as_deref(), Some(".pdf,.doc"));
    }

    #[tokio::test]
    async fn hidden_inputs_are_skipped() {
        let dom = fixture();
        let snapshot = InventoryBuilder::new(&dom).scan().await.unwrap();
        assert!(snapshot.find("csrf_token").is_none());
    }

    #[tokio::test]
    async fn scan_is_idempotent() {
        let dom = fixture();
        let first = InventoryBuilder::new(&dom).scan().await.unwrap();
        let second = InventoryBuilder::new(&dom).scan().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn positional_ids_for_anonymous_controls() {
        let dom = FixtureDom::new(vec![
            ControlSpec::text("x").without_dom_id(),
            ControlSpec::text("y").without_dom_id(),
        ]);
        let snapshot = InventoryBuilder::new(&dom).scan().await.unwrap();
        assert_eq!(snapshot.text_inputs[0].id, "text-input-0");
        assert_eq!(snapshot.text_inputs[1].id, "text-input-1");
    }
}
