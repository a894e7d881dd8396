//! Human-readable label derivation.
//!
//! Planners and result panels both key off these strings, so the chain is
//! deterministic: structural labels first, then attribute hints, then a
//! humanized identifier, then a generic noun for the control kind.

use dom_bridge::{ControlTag, NodeSnapshot};

/// Best label for a single control.
pub fn field_label(snap: &NodeSnapshot) -> String {
    if let Some(text) = clean(snap.explicit_label.as_deref()) {
        return text;
    }
    if let Some(text) = wrapping_text(snap) {
        return text;
    }
    if let Some(text) = clean(snap.aria_label.as_deref()) {
        return text;
    }
    if let Some(text) = clean(snap.placeholder.as_deref()) {
        return text;
    }
    if let Some(ident) = snap.name.as_deref().or(snap.dom_id.as_deref()) {
        let humanized = humanize(ident);
        if !humanized.is_empty() {
            return humanized;
        }
    }
    generic_noun(snap).to_string()
}

/// Best label for a radio group: structural context around the options
/// beats the per-option labels.
pub fn group_label(snap: &NodeSnapshot) -> String {
    if let Some(text) = clean(snap.fieldset_legend.as_deref()) {
        return text;
    }
    if let Some(text) = clean(snap.heading_sibling.as_deref()) {
        return text;
    }
    if let Some(text) = clean(snap.preceding_text.as_deref()) {
        return text;
    }
    field_label(snap)
}

/// Label for one radio option; falls back to the option's own value
/// before giving up on a generic noun.
pub fn option_label(snap: &NodeSnapshot) -> String {
    if let Some(text) = clean(snap.explicit_label.as_deref()) {
        return text;
    }
    if let Some(text) = wrapping_text(snap) {
        return text;
    }
    if let Some(text) = clean(snap.aria_label.as_deref()) {
        return text;
    }
    if !snap.value.trim().is_empty() {
        return humanize(&snap.value);
    }
    generic_noun(snap).to_string()
}

/// Turn an identifier into title-cased words: `first_name` and
/// `first-name` both become `First Name`.
pub fn humanize(ident: &str) -> String {
    ident
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A label wrapping a toggle usually contains the control itself, so the
/// serialized value can leak into the text; strip it.
fn wrapping_text(snap: &NodeSnapshot) -> Option<String> {
    let raw = snap.wrapping_label.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    let is_toggle = snap.type_is("checkbox") || snap.type_is("radio");
    if is_toggle && !snap.value.trim().is_empty() {
        let stripped = raw.replacen(snap.value.trim(), "", 1);
        let stripped = stripped.trim();
        if !stripped.is_empty() {
            return Some(stripped.to_string());
        }
    }
    Some(raw.to_string())
}

fn generic_noun(snap: &NodeSnapshot) -> &'static str {
    match snap.tag {
        ControlTag::Textarea => "Message",
        ControlTag::Select => "Selection",
        ControlTag::Button => "Button",
        ControlTag::Input => {
            if snap.type_is("email") {
                "Email"
            } else if snap.type_is("tel") {
                "Phone"
            } else if snap.type_is("url") {
                "Website"
            } else if snap.type_is("password") {
                "Password"
            } else if snap.type_is("checkbox") {
                "Checkbox"
            } else if snap.type_is("radio") {
                "Radio Option"
            } else if snap.is_file_input() {
                "File Upload"
            } else {
                "Form Field"
            }
        }
    }
}

fn clean(text: Option<&str>) -> Option<String> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(collapse_whitespace(trimmed))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_bridge::ControlSpec;

    fn snap(spec: ControlSpec) -> NodeSnapshot {
        NodeSnapshot {
            tag: spec.tag,
            input_type: spec.input_type,
            dom_id: spec.dom_id,
            name: spec.name,
            placeholder: spec.placeholder,
            value: spec.value,
            explicit_label: spec.explicit_label,
            wrapping_label: spec.wrapping_label,
            aria_label: spec.aria_label,
            fieldset_legend: spec.fieldset_legend,
            heading_sibling: spec.heading_sibling,
            preceding_text: spec.preceding_text,
            visible: true,
            ..Default::default()
        }
    }

    #[test]
    fn explicit_label_wins() {
        let s = snap(
            ControlSpec::text("first_name")
                .labeled("First name")
                .placeholder("Jane"),
        );
        assert_eq!(field_label(&s), "First name");
    }

    #[test]
    fn placeholder_beats_humanized_name() {
        let s = snap(ControlSpec::text("fn").named("first_name").placeholder("Your first name"));
        assert_eq!(field_label(&s), "Your first name");
    }

    #[test]
    fn name_is_humanized() {
        let s = snap(ControlSpec::text("x1").named("first_name").without_dom_id());
        assert_eq!(field_label(&s), "First Name");
    }

    #[test]
    fn generic_noun_as_last_resort() {
        let mut s = snap(ControlSpec::text("x"));
        s.dom_id = None;
        assert_eq!(field_label(&s), "Form Field");
        s.input_type = Some("email".into());
        assert_eq!(field_label(&s), "Email");
    }

    #[test]
    fn wrapping_label_strips_toggle_value() {
        let s = snap(
            ControlSpec::radio("visa", "yes").wrapped_label("yes Yes, I am authorized"),
        );
        assert_eq!(field_label(&s), "Yes, I am authorized");
    }

    #[test]
    fn group_label_prefers_legend() {
        let s = snap(
            ControlSpec::radio("visa", "yes")
                .legend("Work authorization")
                .wrapped_label("Yes"),
        );
        assert_eq!(group_label(&s), "Work authorization");
        assert_eq!(field_label(&s), "Yes");
    }

    #[test]
    fn whitespace_is_collapsed() {
        let s = snap(ControlSpec::text("x").labeled("  First \n  name "));
        assert_eq!(field_label(&s), "First name");
    }
}
