//! Plan parsing and salvage.
//!
//! Planner output arrives as loosely-shaped JSON. Recoverable deviations
//! are repaired here: a bare array of actions is wrapped (and implies
//! submission, since a planner emitting only actions has nothing to say
//! about stopping), a document whose actions sit under a different key is
//! unwrapped from its first array-valued property, and a double-encoded
//! string is re-parsed once. Entries that cannot be repaired become
//! rejected actions so the session reports them per field instead of
//! aborting.

use formpilot_core_types::{ActionItem, ActionKind, ActionPlan, CoverLetterSpec, RejectedAction};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::FlowError;

pub fn parse_plan(raw: &Value) -> Result<ActionPlan, FlowError> {
    let (entries, mut plan) = shape(raw)?;

    for entry in entries {
        match validate(&entry) {
            Ok(item) => plan.actions.push(item),
            Err(rejected) => {
                warn!(element_id = %rejected.element_id, reason = %rejected.reason, "rejected plan entry");
                plan.rejected.push(rejected);
            }
        }
    }

    if plan.actions.is_empty() && plan.rejected.is_empty() {
        return Err(FlowError::PlanFormat(
            "plan contained no actions".to_string(),
        ));
    }
    Ok(plan)
}

/// Normalize the document shape, returning the raw action entries and a
/// plan skeleton carrying the document-level fields.
fn shape(raw: &Value) -> Result<(Vec<Value>, ActionPlan), FlowError> {
    match raw {
        Value::String(inner) => {
            debug!("plan arrived double-encoded; re-parsing");
            let parsed: Value = serde_json::from_str(inner)
                .map_err(|e| FlowError::PlanFormat(format!("unparseable plan string: {e}")))?;
            // One level only; a string inside a string is malformed.
            match parsed {
                Value::String(_) => Err(FlowError::PlanFormat(
                    "plan string nested more than one level".to_string(),
                )),
                other => shape(&other),
            }
        }
        Value::Array(entries) => Ok((
            entries.clone(),
            ActionPlan {
                submit_form: true,
                ..ActionPlan::default()
            },
        )),
        Value::Object(map) => {
            // The decision-maker wire format uses camelCase keys; accept
            // both spellings.
            let entries = match map.get("actions").or_else(|| map.get("formActions")) {
                Some(Value::Array(entries)) => entries.clone(),
                _ => match map.values().find_map(|v| v.as_array()) {
                    Some(entries) => {
                        debug!("plan actions found under a non-standard key");
                        entries.clone()
                    }
                    None => {
                        return Err(FlowError::PlanFormat(
                            "plan has no actions array".to_string(),
                        ))
                    }
                },
            };
            let plan = ActionPlan {
                actions: Vec::new(),
                rejected: Vec::new(),
                submit_form: map
                    .get("submit_form")
                    .or_else(|| map.get("submitForm"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                explanation: map
                    .get("explanation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                cover_letter: map
                    .get("cover_letter")
                    .or_else(|| map.get("coverLetter"))
                    .and_then(|v| serde_json::from_value::<CoverLetterSpec>(v.clone()).ok()),
            };
            Ok((entries, plan))
        }
        other => Err(FlowError::PlanFormat(format!(
            "plan is not an object or array (got {})",
            kind_name(other)
        ))),
    }
}

fn validate(entry: &Value) -> Result<ActionItem, RejectedAction> {
    let Some(map) = entry.as_object() else {
        return Err(RejectedAction {
            element_id: "unknown".to_string(),
            reason: "plan entry is not an object".to_string(),
        });
    };
    let element_id = map
        .get("element_id")
        .or_else(|| map.get("elementId"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let Some(element_id) = element_id else {
        return Err(RejectedAction {
            element_id: "unknown".to_string(),
            reason: "plan entry is missing element_id".to_string(),
        });
    };
    let kind_raw = map
        .get("action")
        .or_else(|| map.get("actionType"))
        .or_else(|| map.get("kind"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let Some(kind) = ActionKind::parse(kind_raw) else {
        return Err(RejectedAction {
            element_id: element_id.to_string(),
            reason: format!("unsupported action type '{kind_raw}'"),
        });
    };
    let value = map.get("value").filter(|v| !v.is_null()).cloned();
    Ok(ActionItem {
        element_id: element_id.to_string(),
        kind,
        value,
        explanation: map
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_plan_parses() {
        let raw = json!({
            "actions": [
                {"element_id": "email", "action": "fill", "value": "a@b.example"},
                {"element_id": "country", "action": "select", "value": "US"}
            ],
            "submit_form": true,
            "explanation": "basic fill"
        });
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.actions.len(), 2);
        assert!(plan.submit_form);
        assert_eq!(plan.explanation, "basic fill");
        assert_eq!(plan.actions[0].kind, ActionKind::Fill);
    }

    #[test]
    fn camel_case_wire_format_parses() {
        let raw = json!({
            "formActions": [
                {"elementId": "email", "actionType": "fill", "value": "a@b.example"},
                {"elementId": "resume_upload", "actionType": "upload", "value": "resumeFile"}
            ],
            "submitForm": true
        });
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.actions.len(), 2);
        assert!(plan.rejected.is_empty());
        assert!(plan.submit_form);
        assert_eq!(plan.actions[0].element_id, "email");
        assert_eq!(plan.actions[1].kind, ActionKind::Upload);
    }

    #[test]
    fn bare_array_is_wrapped_and_implies_submission() {
        let raw = json!([{"element_id": "email", "action": "fill", "value": "x"}]);
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert!(plan.submit_form);
    }

    #[test]
    fn actions_found_under_nonstandard_key() {
        let raw = json!({"steps": [{"element_id": "email", "action": "fill", "value": "x"}]});
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert!(!plan.submit_form);
    }

    #[test]
    fn double_encoded_plan_is_reparsed() {
        let inner = json!({"actions": [{"element_id": "email", "action": "fill", "value": "x"}]});
        let raw = Value::String(inner.to_string());
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.actions.len(), 1);
    }

    #[test]
    fn unsupported_kinds_become_rejections() {
        let raw = json!({
            "actions": [
                {"element_id": "email", "action": "fill", "value": "x"},
                {"element_id": "weird", "action": "hover", "value": "y"},
                {"action": "fill", "value": "no id"}
            ]
        });
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.rejected.len(), 2);
        assert!(plan.rejected[0].reason.contains("hover"));
        assert!(plan.rejected[1].reason.contains("element_id"));
    }

    #[test]
    fn empty_object_is_fatal() {
        assert!(matches!(
            parse_plan(&json!({})),
            Err(FlowError::PlanFormat(_))
        ));
    }

    #[test]
    fn all_invalid_entries_still_produce_a_plan() {
        let raw = json!({"actions": [{"element_id": "x", "action": "hover"}]});
        let plan = parse_plan(&raw).unwrap();
        assert!(plan.actions.is_empty());
        assert_eq!(plan.rejected.len(), 1);
    }

    #[test]
    fn cover_letter_survives_parsing() {
        let raw = json!({
            "actions": [{"element_id": "cl", "action": "upload", "value": "cover letter"}],
            "cover_letter": {"content": "Dear team", "filename": "cover.pdf"}
        });
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.cover_letter.unwrap().filename, "cover.pdf");
    }
}
