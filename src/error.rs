//! Error types shared across the relay and the chat client.

use thiserror::Error;

/// Errors that can occur while composing, relaying or consuming a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The outgoing turn is invalid and was rejected before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The upstream provider rejected the request or failed to stream.
    #[error("upstream provider error: {0}")]
    Upstream(String),

    /// The normalized stream failed mid-flight on the client side.
    #[error("transport error: {0}")]
    Transport(String),

    /// A normalized event line could not be decoded.
    #[error("malformed stream event: {0}")]
    Decode(String),

    /// The web search call failed.
    #[error("web search failed: {0}")]
    Search(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Check whether this error degrades locally instead of rejecting the call.
    ///
    /// Transport, decode and search failures are absorbed by the client
    /// (apology message, skipped line, empty result set). Validation and
    /// upstream failures reject the turn outright.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Decode(_) | Self::Search(_)
        )
    }
}
