//! Axum router construction for the referee API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled so browser-based referee pads and displays can be
//! served from another origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the referee API.
///
/// The router includes:
/// - `POST /button` -- register a station or cast a vote
/// - `POST /reset` -- manual reset
/// - `GET /api/status` -- session and round state
/// - `GET /api/lights` -- current light board
/// - `GET /ws/lights` -- `WebSocket` light board stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Referee stations
        .route("/button", post(handlers::button))
        .route("/reset", post(handlers::reset))
        // Read API
        .route("/api/status", get(handlers::status))
        .route("/api/lights", get(handlers::lights))
        // WebSocket
        .route("/ws/lights", get(ws::ws_lights))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
