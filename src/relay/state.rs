//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::ChatError;
use crate::provider::ProviderClient;

/// Shared application state.
pub struct AppState {
    /// Client for the upstream model provider.
    pub provider: ProviderClient,
}

impl AppState {
    /// Create state from the environment.
    ///
    /// # Errors
    /// Returns an error if the provider client cannot be created.
    pub fn new() -> Result<Arc<Self>, ChatError> {
        Self::with_config(ProviderConfig::from_env())
    }

    /// Create state from an explicit provider configuration.
    ///
    /// # Errors
    /// Returns an error if the provider client cannot be created.
    pub fn with_config(config: ProviderConfig) -> Result<Arc<Self>, ChatError> {
        let provider = ProviderClient::new(config)?;
        Ok(Arc::new(Self { provider }))
    }
}
