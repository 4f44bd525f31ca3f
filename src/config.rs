//! Configuration for the relay, provider, search and client layers.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default upstream provider endpoint.
pub const DEFAULT_PROVIDER_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Default web search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";

/// Default relay base URL the chat client talks to.
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";

/// Fixed cap on search results folded into one turn.
pub const SEARCH_MAX_RESULTS: usize = 5;

/// File name of the persisted conversation history.
pub const HISTORY_FILE: &str = "murmur-chat-history.json";

/// Environment variable for the provider endpoint.
const PROVIDER_URL_ENV: &str = "MURMUR_PROVIDER_URL";
/// Environment variable for the provider API key.
const PROVIDER_API_KEY_ENV: &str = "MURMUR_PROVIDER_API_KEY";
/// Environment variable for the search API key.
const SEARCH_API_KEY_ENV: &str = "MURMUR_SEARCH_API_KEY";
/// Environment variable for the relay base URL.
const RELAY_URL_ENV: &str = "MURMUR_RELAY_URL";
/// Environment variable overriding the data directory.
const DATA_DIR_ENV: &str = "MURMUR_DATA_DIR";

/// Configuration of the upstream model provider connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Streaming endpoint URL.
    pub endpoint: String,
    /// API key; absence makes every chat turn fail with an upstream error.
    pub api_key: Option<String>,
    /// Connection timeout. No read timeout is applied: a stalled provider
    /// stalls the turn.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROVIDER_ENDPOINT.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    /// Build a config from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var(PROVIDER_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_PROVIDER_ENDPOINT.to_string()),
            api_key: std::env::var(PROVIDER_API_KEY_ENV)
                .ok()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok()),
            ..Self::default()
        }
    }

    /// Set the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Configuration of the web search provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL.
    pub endpoint: String,
    /// API key; absence yields empty result sets, never an error.
    pub api_key: Option<String>,
    /// Maximum results requested per search.
    pub max_results: usize,
    /// Total request timeout for the non-streaming search call.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_key: None,
            max_results: SEARCH_MAX_RESULTS,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SearchConfig {
    /// Build a config from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(SEARCH_API_KEY_ENV)
                .ok()
                .or_else(|| std::env::var("TAVILY_API_KEY").ok()),
            ..Self::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Configuration of the chat client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the relay server.
    pub relay_url: String,
    /// Path of the persisted conversation history.
    pub history_path: PathBuf,
    /// Connection timeout for the streaming chat call. No read timeout is
    /// applied while a stream is open.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            history_path: default_history_path(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            relay_url: std::env::var(RELAY_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            ..Self::default()
        }
    }

    /// Set the relay base URL.
    #[must_use]
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into();
        self
    }

    /// Set the history file path.
    #[must_use]
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }
}

/// Resolve the default history file location.
///
/// `MURMUR_DATA_DIR` wins; otherwise the platform data directory is used,
/// falling back to the working directory.
#[must_use]
pub fn default_history_path() -> PathBuf {
    let base = std::env::var(DATA_DIR_ENV).map_or_else(
        |_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("murmur")
        },
        PathBuf::from,
    );
    base.join(HISTORY_FILE)
}

/// Serde helper for `Duration` as whole seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.endpoint, DEFAULT_PROVIDER_ENDPOINT);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_builders() {
        let provider = ProviderConfig::default()
            .with_endpoint("http://localhost:9999/v1/messages")
            .with_api_key("k");
        assert_eq!(provider.endpoint, "http://localhost:9999/v1/messages");
        assert_eq!(provider.api_key.as_deref(), Some("k"));

        let client = ClientConfig::default().with_relay_url("http://localhost:4000");
        assert_eq!(client.relay_url, "http://localhost:4000");
    }

    #[test]
    fn test_search_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, SEARCH_MAX_RESULTS);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_history_path_ends_with_fixed_file_name() {
        let path = default_history_path();
        assert!(path.ends_with(HISTORY_FILE));
    }
}
