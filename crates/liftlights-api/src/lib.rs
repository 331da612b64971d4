//! Referee API server for the referee lights service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Referee endpoints** (`POST /button`, `POST /reset`) used by the
//!   three referee stations and the meet operator
//! - **Read endpoints** (`GET /api/status`, `GET /api/lights`) for the
//!   session state and the current light board
//! - **`WebSocket` endpoint** (`/ws/lights`) streaming light board
//!   states via [`tokio::sync::broadcast`]
//!
//! # Architecture
//!
//! Write endpoints call straight into the shared [`RoundController`].
//! The light board is owned by the display loop in the engine, which
//! pushes every change into [`AppState`]; the read endpoints and
//! `WebSocket` clients only ever see that copy.
//!
//! [`RoundController`]: liftlights_core::RoundController

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
