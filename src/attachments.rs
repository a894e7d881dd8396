use std::path::PathBuf;

use action_executor::{fallback_cover_letter, AttachmentPayload, AttachmentPort};
use async_trait::async_trait;
use base64::Engine as _;
use formpilot_core_types::EngineError;
use tracing::warn;

/// Attachment source backed by local files. The resume is read lazily per
/// upload so a file replaced between runs is picked up without restarting.
pub struct StaticAttachments {
    resume_path: Option<PathBuf>,
}

impl StaticAttachments {
    pub fn new(resume_path: Option<PathBuf>) -> Self {
        Self { resume_path }
    }
}

#[async_trait]
impl AttachmentPort for StaticAttachments {
    async fn resume(&self) -> Option<AttachmentPayload> {
        let path = self.resume_path.as_ref()?;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "resume file unreadable");
                return None;
            }
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());
        Some(AttachmentPayload {
            base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
            mime: mime_for(&filename),
            filename,
        })
    }

    async fn render_cover_letter(
        &self,
        content: &str,
        filename: &str,
    ) -> Result<AttachmentPayload, EngineError> {
        // No renderer on the CLI side; a plain-text document is always valid.
        Ok(fallback_cover_letter(content, filename))
    }
}

fn mime_for(filename: &str) -> String {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn resume_is_encoded_with_its_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let source = StaticAttachments::new(Some(path));
        let payload = source.resume().await.unwrap();
        assert_eq!(payload.filename, "resume.pdf");
        assert_eq!(payload.mime, "application/pdf");
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(payload.base64)
                .unwrap(),
            b"%PDF-1.4"
        );
    }

    #[tokio::test]
    async fn missing_resume_yields_none() {
        let source = StaticAttachments::new(Some(PathBuf::from("/nonexistent/resume.pdf")));
        assert!(source.resume().await.is_none());
        assert!(StaticAttachments::new(None).resume().await.is_none());
    }
}
