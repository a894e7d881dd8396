use async_trait::async_trait;
use base64::Engine as _;
use formpilot_core_types::EngineError;

/// A document ready to hand to a file control, still base64-encoded as
/// received from storage or a renderer.
#[derive(Clone, Debug)]
pub struct AttachmentPayload {
    pub base64: String,
    pub mime: String,
    pub filename: String,
}

/// Source of documents bound during upload actions.
#[async_trait]
pub trait AttachmentPort: Send + Sync {
    /// The stored resume, if the user has one on file.
    async fn resume(&self) -> Option<AttachmentPayload>;

    /// Render cover-letter text into an uploadable document.
    async fn render_cover_letter(
        &self,
        content: &str,
        filename: &str,
    ) -> Result<AttachmentPayload, EngineError>;
}

/// Plain-text cover letter used when rendering fails; a text attachment
/// beats an empty required upload.
pub fn fallback_cover_letter(content: &str, filename: &str) -> AttachmentPayload {
    AttachmentPayload {
        base64: base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
        mime: "text/plain".to_string(),
        filename: filename.to_string(),
    }
}
