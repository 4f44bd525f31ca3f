//! Pending attachment collection for the next outgoing turn.
//!
//! Files are read to raw bytes inside the async task that owns the pending
//! set, then appended as finished attachment values, so concurrent reads
//! cannot interleave half-built state. Completion order of multiple files is
//! not guaranteed.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ChatError;
use crate::message::{DocumentAttachment, ImageAttachment};

/// Attachment kind derived from a file extension.
enum AttachmentKind {
    Image(&'static str),
    Document(&'static str),
}

/// Attachments staged for the next user message; cleared after send.
#[derive(Debug, Default)]
pub struct PendingAttachments {
    images: Vec<ImageAttachment>,
    documents: Vec<DocumentAttachment>,
}

impl PendingAttachments {
    /// Create an empty pending set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.documents.is_empty()
    }

    /// Number of staged images.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of staged documents.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Read a file and stage it as an image or document attachment.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be read, or
    /// [`ChatError::Validation`] for an unsupported extension.
    pub async fn attach_file(&mut self, path: &Path) -> Result<(), ChatError> {
        let kind = classify(path)?;
        let bytes = tokio::fs::read(path).await?;
        let data = STANDARD.encode(&bytes);

        match kind {
            AttachmentKind::Image(format) => self.images.push(ImageAttachment {
                data,
                format: format.to_string(),
            }),
            AttachmentKind::Document(format) => {
                let name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("attachment")
                    .to_string();
                self.documents.push(DocumentAttachment {
                    data,
                    format: format.to_string(),
                    name,
                });
            }
        }
        Ok(())
    }

    /// Take everything staged, leaving the set empty.
    pub fn drain(&mut self) -> (Vec<ImageAttachment>, Vec<DocumentAttachment>) {
        (
            std::mem::take(&mut self.images),
            std::mem::take(&mut self.documents),
        )
    }

    /// Discard everything staged.
    pub fn clear(&mut self) {
        self.images.clear();
        self.documents.clear();
    }
}

/// Classify a path by extension.
fn classify(path: &Path) -> Result<AttachmentKind, ChatError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => Ok(AttachmentKind::Image("png")),
        "jpg" | "jpeg" => Ok(AttachmentKind::Image("jpeg")),
        "gif" => Ok(AttachmentKind::Image("gif")),
        "webp" => Ok(AttachmentKind::Image("webp")),
        "pdf" => Ok(AttachmentKind::Document("pdf")),
        "doc" | "docx" => Ok(AttachmentKind::Document("docx")),
        "txt" | "md" => Ok(AttachmentKind::Document("txt")),
        other => Err(ChatError::Validation(format!(
            "unsupported attachment type: {other:?}"
        ))),
    }
}
