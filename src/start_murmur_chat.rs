//! Startup helpers for the murmur relay server.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::error::ChatError;
use crate::relay::{self, AppState};

/// Environment variable overriding the server port.
const PORT_ENV: &str = "MURMUR_PORT";

/// Run the relay server (used by the `murmur-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting murmur relay v{}", env!("CARGO_PKG_VERSION"));

    let state = match AppState::new() {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("Failed to create state: {err}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("Failed to create runtime: {err}");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = rt.block_on(relay::run_server(state, port)) {
        tracing::error!("Server error: {err}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Run the server with graceful shutdown.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), ChatError>
where
    F: Future<Output = ()> + Send + 'static,
{
    relay::run_server_with_shutdown(state, port, shutdown_signal).await
}

/// Get the configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(relay::DEFAULT_PORT)
}
