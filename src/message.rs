//! Conversation data model: messages, roles and attachments.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed text appended to the log when a turn fails mid-stream.
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model side of the conversation.
    Assistant,
}

/// An image attached to a message, base64-encoded with a format tag.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// Base64-encoded image bytes.
    pub data: String,
    /// Image format tag (e.g. "png", "jpeg").
    pub format: String,
}

/// A document attached to a message, base64-encoded with a format tag and name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DocumentAttachment {
    /// Base64-encoded document bytes.
    pub data: String,
    /// Document format tag (e.g. "pdf", "docx", "txt").
    pub format: String,
    /// Display name, usually the original file name.
    pub name: String,
}

/// A single entry in the conversation log.
///
/// User messages are created on submit; assistant messages are created on the
/// first streamed byte and mutated in place until the turn finalizes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: String,
    /// Author role.
    pub role: Role,
    /// Message text. Grows by appended fragments while streaming.
    pub text: String,
    /// Attached images, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
    /// Attached documents, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentAttachment>,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Create a user message from submitted text and pending attachments.
    #[must_use]
    pub fn user(
        text: impl Into<String>,
        images: Vec<ImageAttachment>,
        documents: Vec<DocumentAttachment>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            text: text.into(),
            images,
            documents,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Create an empty assistant message ready to receive streamed fragments.
    #[must_use]
    pub fn assistant() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            text: String::new(),
            images: Vec::new(),
            documents: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Create the fixed apology message shown when a turn fails.
    #[must_use]
    pub fn apology() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            text: APOLOGY_TEXT.to_string(),
            images: Vec::new(),
            documents: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Whether the message carries neither text nor attachments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.images.is_empty() && self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_construction() {
        let msg = Message::user("hello", Vec::new(), Vec::new());
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text, "hello");
        assert!(!msg.id.is_empty());
        assert!(msg.timestamp > 0);
    }

    #[test]
    fn test_assistant_message_starts_empty() {
        let msg = Message::assistant();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.text.is_empty());
    }

    #[test]
    fn test_apology_text() {
        let msg = Message::apology();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text, APOLOGY_TEXT);
    }

    #[test]
    fn test_is_empty() {
        let msg = Message::user("   ", Vec::new(), Vec::new());
        assert!(msg.is_empty());

        let with_image = Message::user(
            "",
            vec![ImageAttachment {
                data: "aGk=".to_string(),
                format: "png".to_string(),
            }],
            Vec::new(),
        );
        assert!(!with_image.is_empty());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let value = serde_json::to_value(Role::Assistant).unwrap();
        assert_eq!(value, serde_json::json!("assistant"));
    }

    #[test]
    fn test_empty_attachments_are_omitted() {
        let msg = Message::user("hi", Vec::new(), Vec::new());
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("images").is_none());
        assert!(value.get("documents").is_none());
    }
}
