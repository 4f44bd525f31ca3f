//! Web search provider client.
//!
//! One non-streaming call per chat turn, producing ephemeral results that the
//! composer folds into a system context block. Missing credentials yield an
//! empty result set rather than an error, so search never blocks a turn.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::ChatError;

/// A single web search result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Extracted page content or snippet.
    #[serde(default)]
    pub content: String,
}

/// Request body for the search provider.
#[derive(Debug, Serialize)]
struct SearchRequestBody<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
}

/// Response body of the search provider.
#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Client for the external web search API.
pub struct SearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    /// Create a new search client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: SearchConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Whether credentials are configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Run one search and return up to the configured number of results.
    ///
    /// Absence of credentials is not an error: the call logs a warning and
    /// returns an empty set.
    ///
    /// # Errors
    /// Returns [`ChatError::Search`] if the provider rejects the call or the
    /// response cannot be parsed.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ChatError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::warn!("search API key not configured, returning no results");
            return Ok(Vec::new());
        };

        let body = SearchRequestBody {
            api_key,
            query,
            search_depth: "basic",
            max_results: self.config.max_results,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| ChatError::Search(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::Search(format!(
                "search provider returned status {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|err| ChatError::Search(err.to_string()))?;
        let mut results = parse_results(&text)?;
        results.truncate(self.config.max_results);
        Ok(results)
    }
}

/// Parse the provider response body into results.
fn parse_results(body: &str) -> Result<Vec<SearchResult>, ChatError> {
    let parsed: SearchResponseBody =
        serde_json::from_str(body).map_err(|err| ChatError::Search(err.to_string()))?;
    Ok(parsed.results)
}
