//! Error types for the referee API.
//!
//! [`ApiError`] wraps every failure a request can hit and converts it
//! into an HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! failed registration answers `409 Conflict`; every other rejection is
//! `400 Bad Request`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use liftlights_core::RefereeError;
use tracing::warn;

/// Errors that can occur in the referee API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The core rejected a registration.
    #[error(transparent)]
    Registration(RefereeError),

    /// The core rejected a vote or the requested action.
    #[error(transparent)]
    Referee(#[from] RefereeError),

    /// The request body was missing or not valid JSON.
    #[error("{0}")]
    BadRequest(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid JSON body: {err}"))
    }
}

impl ApiError {
    /// HTTP status this error answers with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Registration(_) | Self::Referee(RefereeError::AlreadyClaimed(_)) => {
                StatusCode::CONFLICT
            }
            Self::Referee(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        warn!(status = status.as_u16(), error = %message, "request rejected");

        let body = serde_json::json!({
            "ok": false,
            "error": message,
            "message": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
