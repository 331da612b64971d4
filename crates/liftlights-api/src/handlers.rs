//! REST endpoint handlers for the referee API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/button` | Register a station or cast a vote |
//! | `POST` | `/reset` | Manual reset: new session, lights off |
//! | `GET` | `/api/status` | Current session and round state |
//! | `GET` | `/api/lights` | Current light board |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use liftlights_core::{RefereeError, ResetReport, VoteReceipt};
use liftlights_types::{Position, RoundOutcome, RoundState, SessionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /button`.
#[derive(Debug, Deserialize)]
pub struct ButtonRequest {
    /// Position the station speaks for (`left`, `center`, `right`).
    #[serde(default)]
    pub referee: String,
    /// `register` or `vote`.
    pub action: Option<String>,
    /// `red` or `white`; only read for votes.
    pub button: Option<String>,
}

/// Response for a successful registration.
#[derive(Debug, Serialize)]
struct RegisterResponse {
    ok: bool,
    message: &'static str,
    position: Position,
}

/// Response for an accepted vote.
#[derive(Debug, Serialize)]
struct VoteResponse {
    ok: bool,
    position: Position,
    votes_in: usize,
    round_state: RoundState,
    outcome: Option<RoundOutcome>,
}

impl From<VoteReceipt> for VoteResponse {
    fn from(receipt: VoteReceipt) -> Self {
        Self {
            ok: true,
            position: receipt.position,
            votes_in: receipt.votes_in,
            round_state: receipt.round_state,
            outcome: receipt.outcome,
        }
    }
}

/// Response for `POST /reset`.
#[derive(Debug, Serialize)]
struct ResetResponse {
    ok: bool,
    message: &'static str,
    previous_session_id: SessionId,
    session_id: SessionId,
    timer_cancelled: bool,
    discarded_events: usize,
}

impl From<ResetReport> for ResetResponse {
    fn from(report: ResetReport) -> Self {
        Self {
            ok: true,
            message: "Election reset",
            previous_session_id: report.previous_session_id,
            session_id: report.session_id,
            timer_cancelled: report.timer_cancelled,
            discarded_events: report.discarded_events,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /button
// ---------------------------------------------------------------------------

/// Register a referee station or record its vote.
///
/// The body is parsed as JSON whatever its `Content-Type` says. Referee,
/// action and button are matched case-insensitively. A missing or
/// unknown action is rejected without touching the session.
pub async fn button(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: ButtonRequest = serde_json::from_slice(&body)?;
    let action = request.action.as_deref().unwrap_or_default().trim();
    debug!(referee = %request.referee, action, "button pressed");

    if action.eq_ignore_ascii_case("register") {
        let position = state
            .controller
            .register(&request.referee)
            .await
            .map_err(ApiError::Registration)?;
        return Ok(Json(RegisterResponse {
            ok: true,
            message: "Registered",
            position,
        })
        .into_response());
    }

    if action.eq_ignore_ascii_case("vote") {
        let button = request.button.as_deref().unwrap_or_default();
        let receipt = state
            .controller
            .submit_vote(&request.referee, button)
            .await?;
        return Ok(Json(VoteResponse::from(receipt)).into_response());
    }

    Err(RefereeError::InvalidAction(action.to_owned()).into())
}

// ---------------------------------------------------------------------------
// POST /reset
// ---------------------------------------------------------------------------

/// Close the current session: free every position, drop pending votes,
/// cancel the auto-reset and turn the lights off.
pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.controller.reset().await;
    Json(ResetResponse::from(report))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Current session, round and queue state.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.status().await)
}

// ---------------------------------------------------------------------------
// GET /api/lights
// ---------------------------------------------------------------------------

/// The light board as last drawn by the display loop.
pub async fn lights(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.board())
}
