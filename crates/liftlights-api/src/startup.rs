//! Referee server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_api`] which launches the referee HTTP + `WebSocket`
//! server on a background Tokio task, so the API runs alongside the
//! display loop.
//!
//! # Usage
//!
//! ```rust,ignore
//! use liftlights_api::server::ServerConfig;
//! use liftlights_api::startup::spawn_api;
//!
//! let handle = spawn_api(ServerConfig::default(), state, shutdown_rx)?;
//! // ... later, after signalling shutdown:
//! handle.await?;
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the referee server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server configuration is unusable.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the referee HTTP server on a background Tokio task.
///
/// The address is validated before the task is spawned so obvious
/// misconfigurations surface to the caller. Bind and serve failures
/// after that point are logged by the task itself. The server stops
/// when `shutdown` flips to `true`.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if `config` does not describe a
/// valid socket address.
pub fn spawn_api(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, StartupError> {
    let addr = config.socket_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state, shutdown).await {
            tracing::error!(error = %e, "Referee server exited with error");
        }
    });

    tracing::info!(%addr, "Referee server spawned on background task");

    Ok(handle)
}
