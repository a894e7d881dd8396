//! Terminal rendering of inventories and session results.

use formpilot_core_types::{FieldRecord, FormSnapshot};
use session_flow::SessionOutcome;

pub fn render_outcome(outcome: &SessionOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", outcome.message));
    if !outcome.results.is_empty() {
        out.push('\n');
    }
    for (id, result) in &outcome.results {
        if result.is_success() {
            let value = result.value.as_deref().unwrap_or("-");
            out.push_str(&format!("  ok   {} ({id}): {value}\n", result.label));
        } else {
            let error = result.error.as_deref().unwrap_or("unknown error");
            out.push_str(&format!("  FAIL {} ({id}): {error}\n", result.label));
        }
    }
    out.push_str(&format!(
        "\n{} succeeded, {} failed, submitted: {}\n",
        outcome.success_count(),
        outcome.error_count(),
        if outcome.submitted { "yes" } else { "no" }
    ));
    out
}

pub fn render_snapshot(snapshot: &FormSnapshot) -> String {
    let mut out = String::new();
    section(&mut out, "Text inputs", &snapshot.text_inputs);
    section(&mut out, "Textareas", &snapshot.textareas);
    section(&mut out, "Selects", &snapshot.selects);
    section(&mut out, "Checkboxes", &snapshot.checkboxes);
    if !snapshot.radio_groups.is_empty() {
        out.push_str(&format!("Radio groups ({}):\n", snapshot.radio_groups.len()));
        for group in &snapshot.radio_groups {
            let values: Vec<&str> = group.options.iter().map(|o| o.value.as_str()).collect();
            out.push_str(&format!(
                "  {} [{}]{}: {}\n",
                group.label,
                group.name,
                if group.required { " (required)" } else { "" },
                values.join(", ")
            ));
        }
    }
    section(&mut out, "File inputs", &snapshot.file_inputs);
    section(&mut out, "Buttons", &snapshot.buttons);
    out.push_str(&format!("\n{} field(s) total\n", snapshot.field_count()));
    out
}

fn section(out: &mut String, title: &str, fields: &[FieldRecord]) {
    if fields.is_empty() {
        return;
    }
    out.push_str(&format!("{title} ({}):\n", fields.len()));
    for field in fields {
        out.push_str(&format!(
            "  {} [{}]{}\n",
            field.label,
            field.id,
            if field.required { " (required)" } else { "" }
        ));
    }
}
