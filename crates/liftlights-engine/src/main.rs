//! Engine binary for the referee lights service.
//!
//! Wires the round controller, the display loop and the referee API
//! together and runs them until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `liftlights.yaml` (or `$LIFTLIGHTS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the light event channel and the round controller
//! 4. Start the display loop
//! 5. Start the referee API server
//! 6. Wait for `Ctrl-C`, then stop both and log the final board

mod board_callback;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use liftlights_api::server::ServerConfig;
use liftlights_api::state::AppState;
use liftlights_core::config::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE, LightsConfig, LogFormat, LoggingConfig,
};
use liftlights_core::display::{LightBoard, run_display};
use liftlights_core::{EventChannel, RoundController};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::board_callback::BoardCallback;
use crate::error::EngineError;

/// Where the configuration came from, for the startup log line.
enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, the API server or the
/// shutdown signal fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so this comes first.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!("liftlights-engine starting");
    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "Configuration loaded"),
        ConfigSource::Defaults => info!("Config file not found, using defaults"),
    }
    info!(
        host = %config.server.host,
        port = config.server.port,
        reset_delay_ms = config.round.reset_delay_ms,
        poll_interval_ms = config.display.poll_interval_ms,
        event_capacity = config.display.event_capacity,
        "Configuration in effect"
    );

    // 3. Session objects.
    let events = Arc::new(EventChannel::new(config.display.event_capacity));
    let controller = Arc::new(RoundController::from_config(
        &config.round,
        Arc::clone(&events),
    ));
    let app_state = Arc::new(AppState::new(Arc::clone(&controller)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 4. Display loop.
    let display_handle = {
        let events = Arc::clone(&events);
        let state = Arc::clone(&app_state);
        let poll_interval = config.display.poll_interval();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut callback = BoardCallback::new(state);
            run_display(events, LightBoard::new(), poll_interval, &mut callback, shutdown).await
        })
    };

    // 5. Referee API.
    let api_handle = liftlights_api::startup::spawn_api(
        ServerConfig::from(&config.server),
        Arc::clone(&app_state),
        shutdown_rx,
    )
    .map_err(EngineError::from)?;

    // 6. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(EngineError::from)?;
    info!("Shutdown requested");
    // Err means every receiver already exited.
    let _ = shutdown_tx.send(true);

    api_handle.await.map_err(EngineError::from)?;
    let board = display_handle.await.map_err(EngineError::from)?;
    let status = controller.status().await;

    let final_board = board.state();
    info!(
        session_id = %status.session_id,
        rounds_completed = status.rounds_completed,
        left = final_board.left.css_name(),
        center = final_board.center.css_name(),
        right = final_board.right.css_name(),
        "liftlights-engine stopped"
    );

    Ok(())
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log level {:?}: {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Load configuration.
///
/// An explicit `$LIFTLIGHTS_CONFIG` path must exist. Without it,
/// `liftlights.yaml` in the working directory is used if present and
/// defaults otherwise; environment overrides apply either way.
fn load_config() -> Result<(LightsConfig, ConfigSource), EngineError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        let config = LightsConfig::from_file(&path)?;
        return Ok((config, ConfigSource::File(path)));
    }

    let config_path = Path::new(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        let config = LightsConfig::from_file(config_path)?;
        Ok((config, ConfigSource::File(config_path.to_path_buf())))
    } else {
        let mut config = LightsConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, ConfigSource::Defaults))
    }
}
