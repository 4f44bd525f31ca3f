//! Wire types for the relay chat endpoint.
//!
//! The same shapes are serialized by the chat client and deserialized by the
//! relay handler, so both halves share this module.

use serde::{Deserialize, Serialize};

use crate::message::{DocumentAttachment, ImageAttachment, Message, Role};
use crate::search::SearchResult;

/// Body of `POST /api/chat`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Full conversation history, oldest first.
    pub messages: Vec<WireMessage>,
    /// Logical model name; unknown names fall back to the default.
    #[serde(default)]
    pub model: String,
    /// Whether to request an extended-reasoning budget from the provider.
    #[serde(default)]
    pub extended_thinking: bool,
    /// Pre-computed web search results to fold into the system context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_results: Vec<SearchResult>,
}

/// One conversation entry as sent over the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireMessage {
    /// Author role.
    pub role: Role,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Attached images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentAttachment>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
            images: message.images.clone(),
            documents: message.documents.clone(),
        }
    }
}

/// JSON body of a failed relay response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}
