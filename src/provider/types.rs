//! Request and event types for the upstream model provider.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::Role;

/// A normalized view of one upstream stream event.
///
/// The provider emits many event kinds; only text deltas and the logical
/// completion matter to the relay. Everything else collapses into `Other`,
/// which callers drop, so re-encoding is a total mapping.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProviderEvent {
    /// A fragment of assistant text.
    TextDelta(String),
    /// The logical end of the response.
    Completion,
    /// Any event kind the relay does not re-encode.
    Other,
}

impl ProviderEvent {
    /// Parse one event payload.
    ///
    /// Unknown kinds and unparsable payloads map to [`ProviderEvent::Other`];
    /// only an explicit provider error aborts the stream.
    ///
    /// # Errors
    /// Returns [`ChatError::Upstream`] when the payload carries a provider
    /// error event.
    pub fn parse(payload: &str) -> Result<Self, ChatError> {
        let Ok(raw) = serde_json::from_str::<RawEvent>(payload) else {
            return Ok(Self::Other);
        };

        match raw {
            RawEvent::ContentBlockDelta { delta } => {
                if delta.kind == "text_delta" && !delta.text.is_empty() {
                    Ok(Self::TextDelta(delta.text))
                } else {
                    Ok(Self::Other)
                }
            }
            RawEvent::MessageStop => Ok(Self::Completion),
            RawEvent::Error { error } => Err(ChatError::Upstream(error.message)),
            RawEvent::Other => Ok(Self::Other),
        }
    }
}

/// Raw upstream event payload, discriminated by its `type` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawEvent {
    ContentBlockDelta { delta: RawDelta },
    MessageStop,
    Error { error: RawError },
    #[serde(other)]
    Other,
}

/// Delta carried by a `content_block_delta` event.
#[derive(Debug, Deserialize)]
struct RawDelta {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Error carried by an `error` event.
#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    message: String,
}

/// A streaming request to the provider.
#[derive(Clone, Debug, Serialize)]
pub struct ConverseRequest {
    /// Concrete provider model identifier.
    pub model: String,
    /// Maximum output length in tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Always true; the relay only speaks the streaming protocol.
    pub stream: bool,
    /// System-level instruction blocks. Omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<SystemBlock>,
    /// Role-tagged conversation turns.
    pub messages: Vec<ProviderMessage>,
    /// Extended-reasoning directive. Must be entirely absent when disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingDirective>,
}

/// One system-level instruction block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemBlock {
    /// Instruction text.
    pub text: String,
}

/// One conversation turn in provider form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// Author role.
    pub role: Role,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

/// A typed content block: text, image or document.
///
/// Binary payloads are held as raw bytes and serialized base64 on the wire.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// Block text.
        text: String,
    },
    /// An image with a format tag.
    Image {
        /// Image format tag (e.g. "png").
        format: String,
        /// Raw image bytes.
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    /// A document with a format tag and display name.
    Document {
        /// Document format tag (e.g. "pdf").
        format: String,
        /// Display name.
        name: String,
        /// Raw document bytes.
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

/// Extended-reasoning directive with a fixed token budget.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThinkingDirective {
    /// Directive kind; always "enabled" when present.
    #[serde(rename = "type")]
    pub kind: String,
    /// Reasoning token budget.
    pub budget_tokens: u32,
}

impl ThinkingDirective {
    /// Create an enabled directive with the given budget.
    #[must_use]
    pub fn enabled(budget_tokens: u32) -> Self {
        Self {
            kind: "enabled".to_string(),
            budget_tokens,
        }
    }
}

/// Serde helper encoding byte payloads as standard base64 strings.
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_delta() {
        let payload = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(
            ProviderEvent::parse(payload).unwrap(),
            ProviderEvent::TextDelta("Hi".to_string())
        );
    }

    #[test]
    fn test_parse_non_text_delta_is_other() {
        let payload =
            r#"{"type":"content_block_delta","delta":{"type":"thinking_delta","thinking":"…"}}"#;
        assert_eq!(ProviderEvent::parse(payload).unwrap(), ProviderEvent::Other);
    }

    #[test]
    fn test_parse_message_stop() {
        assert_eq!(
            ProviderEvent::parse(r#"{"type":"message_stop"}"#).unwrap(),
            ProviderEvent::Completion
        );
    }

    #[test]
    fn test_parse_unknown_event_is_other() {
        assert_eq!(
            ProviderEvent::parse(r#"{"type":"message_start","message":{}}"#).unwrap(),
            ProviderEvent::Other
        );
        assert_eq!(ProviderEvent::parse("not json").unwrap(), ProviderEvent::Other);
    }

    #[test]
    fn test_parse_error_event() {
        let payload = r#"{"type":"error","error":{"type":"overloaded_error","message":"busy"}}"#;
        let err = ProviderEvent::parse(payload).unwrap_err();
        assert!(matches!(err, ChatError::Upstream(message) if message == "busy"));
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = ConverseRequest {
            model: "m".to_string(),
            max_tokens: 4096,
            temperature: 1.0,
            stream: true,
            system: Vec::new(),
            messages: vec![ProviderMessage {
                role: Role::User,
                content: vec![
                    ContentBlock::Text {
                        text: "hi".to_string(),
                    },
                    ContentBlock::Image {
                        format: "png".to_string(),
                        data: vec![1, 2, 3],
                    },
                ],
            }],
            thinking: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("system").is_none());
        assert!(value.get("thinking").is_none());
        assert_eq!(value["messages"][0]["content"][0]["type"], "text");
        assert_eq!(value["messages"][0]["content"][1]["type"], "image");
        assert_eq!(value["messages"][0]["content"][1]["data"], "AQID");
    }

    #[test]
    fn test_content_block_base64_round_trip() {
        let block = ContentBlock::Document {
            format: "pdf".to_string(),
            name: "report.pdf".to_string(),
            data: b"%PDF-1.7".to_vec(),
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }
}
