//! Request composition: conversation history, model choice, reasoning flag
//! and search context, reshaped into one provider request.
//!
//! This is a pure transformation; nothing here touches the network.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ChatError;
use crate::provider::{
    ContentBlock, ConverseRequest, ProviderMessage, SystemBlock, ThinkingDirective,
};
use crate::search::SearchResult;
use crate::wire::{ChatRequest, WireMessage};

/// Maximum output length in tokens.
pub const MAX_TOKENS: u32 = 4096;

/// Fixed sampling temperature.
pub const TEMPERATURE: f32 = 1.0;

/// Fixed extended-reasoning token budget.
pub const THINKING_BUDGET_TOKENS: u32 = 10_000;

/// Logical model name used when the requested one is unknown.
pub const DEFAULT_MODEL: &str = "sonnet-4.5";

/// Mapping from logical model names to provider identifiers.
const MODEL_IDS: [(&str, &str); 2] = [
    ("sonnet-4.5", "us.anthropic.claude-sonnet-4-5-20250929-v1:0"),
    ("opus-4.1", "us.anthropic.claude-opus-4-20250514-v1:0"),
];

/// Instruction prefixed to the synthesized search context block.
const SEARCH_CONTEXT_PREAMBLE: &str =
    "You have access to the following web search results. Use them to provide up-to-date information:";

/// Resolve a logical model name to a provider identifier.
///
/// The mapping is total: unknown names fall back to [`DEFAULT_MODEL`].
#[must_use]
pub fn resolve_model_id(name: &str) -> &'static str {
    let fallback = MODEL_IDS[0].1;
    MODEL_IDS
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(fallback, |(_, id)| *id)
}

/// Compose one provider request from a chat request.
///
/// Content blocks follow the fixed order text, images, documents, one block
/// per non-empty field. Search results, when present, become exactly one
/// system block. The thinking directive is attached only when requested.
///
/// # Errors
/// Returns [`ChatError::Validation`] if the message list is empty or an
/// attachment payload is not valid base64.
pub fn compose(request: &ChatRequest) -> Result<ConverseRequest, ChatError> {
    if request.messages.is_empty() {
        return Err(ChatError::Validation(
            "message history is empty".to_string(),
        ));
    }

    let messages = request
        .messages
        .iter()
        .map(provider_message)
        .collect::<Result<Vec<_>, _>>()?;

    let system = search_context(&request.search_results)
        .map(|text| vec![SystemBlock { text }])
        .unwrap_or_default();

    Ok(ConverseRequest {
        model: resolve_model_id(&request.model).to_string(),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        stream: true,
        system,
        messages,
        thinking: request
            .extended_thinking
            .then(|| ThinkingDirective::enabled(THINKING_BUDGET_TOKENS)),
    })
}

/// Map one wire message to provider content blocks.
fn provider_message(message: &WireMessage) -> Result<ProviderMessage, ChatError> {
    let mut content = Vec::new();

    if !message.text.is_empty() {
        content.push(ContentBlock::Text {
            text: message.text.clone(),
        });
    }
    for image in &message.images {
        content.push(ContentBlock::Image {
            format: image.format.clone(),
            data: decode_payload(&image.data)?,
        });
    }
    for document in &message.documents {
        content.push(ContentBlock::Document {
            format: document.format.clone(),
            name: document.name.clone(),
            data: decode_payload(&document.data)?,
        });
    }

    Ok(ProviderMessage {
        role: message.role,
        content,
    })
}

/// Decode one base64 attachment payload to raw bytes.
fn decode_payload(data: &str) -> Result<Vec<u8>, ChatError> {
    STANDARD
        .decode(data.as_bytes())
        .map_err(|err| ChatError::Validation(format!("invalid base64 attachment: {err}")))
}

/// Synthesize the system context block from search results.
///
/// Each result renders as `[title](url)` followed by its content, joined by
/// blank lines. Returns `None` when there are no results.
fn search_context(results: &[SearchResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let joined = results
        .iter()
        .map(|result| format!("[{}]({})\n{}", result.title, result.url, result.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(format!("{SEARCH_CONTEXT_PREAMBLE}\n\n{joined}"))
}
