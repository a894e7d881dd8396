//! File binding.
//!
//! The target is the resolved control when it really is a file input;
//! otherwise discovery walks the document's file inputs through a ladder of
//! hints (id, name, aria label, container tokens, accept list) before
//! settling for any file input at all. Binding itself degrades the same
//! way: synthetic transfer, then a direct file-list override, then opening
//! the native picker for the user.

use base64::Engine as _;
use dom_bridge::{DomEvent, DomPort, FilePayload, NodeId, NodeSnapshot};
use field_resolver::FieldResolver;
use formpilot_core_types::{CoverLetterSpec, FormSnapshot};
use tracing::{debug, warn};

use crate::errors::ExecError;
use crate::executor::Applied;
use crate::ports::{fallback_cover_letter, AttachmentPayload, AttachmentPort};
use crate::tempo::Tempo;

/// Reported as the action's value when the engine hands control to the
/// user's file picker instead of binding a file itself.
pub const MANUAL_UPLOAD: &str = "manual upload requested";

const DECODE_CHUNK: usize = 8192;

enum PayloadKind {
    Resume,
    CoverLetter,
}

impl PayloadKind {
    fn of(semantic: &str) -> Self {
        let lower = semantic.to_lowercase();
        if lower.contains("cover") || lower.contains("letter") {
            PayloadKind::CoverLetter
        } else {
            PayloadKind::Resume
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            PayloadKind::Resume => &["resume", "cv"],
            PayloadKind::CoverLetter => &["cover", "letter"],
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn run(
    dom: &dyn DomPort,
    resolver: &dyn FieldResolver,
    attachments: &dyn AttachmentPort,
    tempo: &Tempo,
    snapshot: &FormSnapshot,
    element_id: &str,
    semantic: &str,
    cover_letter: Option<&CoverLetterSpec>,
) -> Result<Applied, ExecError> {
    let kind = PayloadKind::of(semantic);

    let resolved = resolver.resolve(snapshot, element_id).await.ok();
    let resolved_is_file = match resolved {
        Some(node) => dom.describe(node).await?.is_file_input(),
        None => false,
    };
    let target = if resolved_is_file {
        resolved
    } else {
        discover(dom, kind.keywords()).await?
    };

    let Some(node) = target else {
        // The plan may point at a styled upload button with the real input
        // rendered only after interaction; clicking it is the best we can do.
        if let Some(button) = resolved {
            return manual(dom, button).await;
        }
        return Err(ExecError::ElementNotFound);
    };

    let _ = dom.scroll_into_view(node).await;
    let _ = dom.highlight(node).await;
    tempo.pause(tempo.highlight_hold).await;
    let out = bind(dom, attachments, tempo, element_id, node, kind, cover_letter).await;
    let _ = dom.clear_highlight(node).await;
    out
}

async fn bind(
    dom: &dyn DomPort,
    attachments: &dyn AttachmentPort,
    tempo: &Tempo,
    element_id: &str,
    node: NodeId,
    kind: PayloadKind,
    cover_letter: Option<&CoverLetterSpec>,
) -> Result<Applied, ExecError> {
    let payload = match kind {
        PayloadKind::Resume => match attachments.resume().await {
            Some(payload) => payload,
            None => {
                warn!(element_id, "no stored resume; opening picker");
                return manual(dom, node).await;
            }
        },
        PayloadKind::CoverLetter => cover_letter_payload(attachments, cover_letter).await?,
    };

    let file = FilePayload {
        bytes: decode_base64(&payload.base64)?,
        name: payload.filename.clone(),
        mime: payload.mime.clone(),
    };

    let mut applied = Applied::default();
    match dom.attach_files(node, &file).await {
        Ok(()) => {}
        Err(dom_bridge::DomError::AssignmentRefused(reason)) => {
            debug!(%reason, "synthetic transfer refused; overriding file list");
            match dom.override_file_list(node, &file).await {
                Ok(()) => applied.warn("file bound via property override".to_string()),
                Err(dom_bridge::DomError::AssignmentRefused(reason)) => {
                    warn!(%reason, "file list override refused; opening picker");
                    return manual(dom, node).await;
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(other) => return Err(other.into()),
    }

    dom.dispatch(node, DomEvent::Input).await?;
    dom.dispatch(node, DomEvent::Change).await?;
    tempo.pause(tempo.settle).await;

    if dom.describe(node).await?.files.is_empty() {
        warn!(element_id, "file list empty after binding; opening picker");
        return manual(dom, node).await;
    }

    applied.value = Some(file.name);
    Ok(applied)
}

async fn cover_letter_payload(
    attachments: &dyn AttachmentPort,
    spec: Option<&CoverLetterSpec>,
) -> Result<AttachmentPayload, ExecError> {
    let Some(spec) = spec.filter(|s| !s.content.trim().is_empty()) else {
        return Err(ExecError::AttachmentUnavailable(
            "plan carries no cover letter content".to_string(),
        ));
    };
    let filename = if spec.filename.trim().is_empty() {
        "cover_letter.txt"
    } else {
        spec.filename.as_str()
    };
    match attachments.render_cover_letter(&spec.content, filename).await {
        Ok(payload) => Ok(payload),
        Err(err) => {
            warn!(error = %err, "cover letter rendering failed; using plain text");
            Ok(fallback_cover_letter(&spec.content, filename))
        }
    }
}

async fn manual(dom: &dyn DomPort, node: NodeId) -> Result<Applied, ExecError> {
    dom.click(node).await?;
    let mut applied = Applied::with_value(MANUAL_UPLOAD);
    applied.warn("file picker opened for manual selection".to_string());
    Ok(applied)
}

/// Tiered search across the document's file inputs. Within a tier, a
/// candidate whose label text also carries a keyword wins over document
/// order.
async fn discover(dom: &dyn DomPort, keywords: &[&str]) -> Result<Option<NodeId>, ExecError> {
    let mut candidates = Vec::new();
    for node in dom.controls().await? {
        let snap = dom.describe(node).await?;
        if snap.is_file_input() {
            candidates.push((node, snap));
        }
    }
    if candidates.is_empty() {
        return Ok(None);
    }

    let tiers: [&dyn Fn(&NodeSnapshot) -> bool; 7] = [
        &|s| contains_keyword(s.dom_id.as_deref(), keywords),
        &|s| contains_keyword(s.name.as_deref(), keywords),
        &|s| contains_keyword(s.aria_label.as_deref(), keywords),
        &|s| contains_keyword(s.container_hint.as_deref(), keywords),
        &|s| contains_keyword(s.accept.as_deref(), &["pdf", "doc"]),
        &|s| s.visible,
        &|_| true,
    ];

    for tier in tiers {
        let matched: Vec<&(NodeId, NodeSnapshot)> =
            candidates.iter().filter(|(_, s)| tier(s)).collect();
        if matched.is_empty() {
            continue;
        }
        if matched.len() > 1 {
            if let Some((node, _)) = matched
                .iter()
                .find(|(_, s)| contains_keyword(Some(label_text(s).as_str()), keywords))
            {
                return Ok(Some(*node));
            }
        }
        return Ok(Some(matched[0].0));
    }
    Ok(None)
}

fn label_text(snap: &NodeSnapshot) -> String {
    [
        snap.explicit_label.as_deref(),
        snap.wrapping_label.as_deref(),
        snap.aria_label.as_deref(),
        snap.preceding_text.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}

fn contains_keyword(text: Option<&str>, keywords: &[&str]) -> bool {
    let Some(text) = text else {
        return false;
    };
    let lower = text.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

/// Decode in alignment-preserving chunks so a multi-megabyte document does
/// not need a second contiguous text buffer.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, ExecError> {
    let body = encoded
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(encoded);
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let mut bytes = Vec::with_capacity(compact.len() / 4 * 3);
    let engine = base64::engine::general_purpose::STANDARD;
    let raw = compact.as_bytes();
    let mut offset = 0;
    while offset < raw.len() {
        let end = (offset + DECODE_CHUNK).min(raw.len());
        let chunk = engine
            .decode(&raw[offset..end])
            .map_err(|e| ExecError::InvalidPayload(format!("base64 decode failed: {e}")))?;
        bytes.extend_from_slice(&chunk);
        offset = end;
    }
    Ok(bytes)
}
