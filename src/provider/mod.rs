//! Client for the upstream model provider's streaming API.
//!
//! Exactly one streaming call is opened per chat turn; there is no retry and
//! no resume. Failures before a stream exists surface as upstream errors, and
//! a mid-stream provider error aborts the event stream.

pub mod types;

pub use types::{
    ContentBlock, ConverseRequest, ProviderEvent, ProviderMessage, SystemBlock, ThinkingDirective,
};

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use reqwest::header;

use crate::config::ProviderConfig;
use crate::error::ChatError;
use crate::sse::DataLineDecoder;

/// Provider API protocol version header value.
const API_VERSION: &str = "2023-06-01";

/// Boxed stream of parsed provider events.
pub type ProviderEventStream = Pin<Box<dyn Stream<Item = Result<ProviderEvent, ChatError>> + Send>>;

/// HTTP client for the upstream provider.
pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a new provider client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ProviderConfig) -> Result<Self, ChatError> {
        // Connect timeout only: an open stream must be allowed to idle.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Open one streaming call and return the parsed event stream.
    ///
    /// # Errors
    /// Returns [`ChatError::Upstream`] when credentials are missing, the
    /// request cannot be sent, or the provider responds with a non-success
    /// status. In all three cases no stream is opened.
    pub async fn converse_stream(
        &self,
        request: ConverseRequest,
    ) -> Result<ProviderEventStream, ChatError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(ChatError::Upstream(
                "provider API key is not configured".to_string(),
            ));
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header(header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|err| ChatError::Upstream(format!("provider request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Upstream(format!(
                "provider returned status {status}: {body}"
            )));
        }

        let mut lines = DataLineDecoder::new();
        let events = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => lines
                    .push(bytes.as_ref())
                    .iter()
                    .map(|payload| ProviderEvent::parse(payload))
                    .collect::<Vec<_>>(),
                Err(err) => vec![Err(ChatError::Upstream(format!(
                    "provider stream failed: {err}"
                )))],
            })
            .flat_map(stream::iter);

        Ok(Box::pin(events))
    }
}
