//! `WebSocket` handler for real-time light board streaming.
//!
//! Clients connect to `GET /ws/lights`, immediately receive the current
//! [`LightBoardState`] as a JSON text frame, and then one frame per board
//! change. A client that falls behind skips straight to the newest
//! board; only the latest state matters for a display.
//!
//! [`LightBoardState`]: liftlights_types::LightBoardState

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use liftlights_types::LightBoardState;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming light board updates.
///
/// # Route
///
/// `GET /ws/lights`
pub async fn ws_lights(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Serialize `board` and send it. Returns `false` once the client is gone.
async fn send_board(socket: &mut WebSocket, board: &LightBoardState) -> bool {
    let json = match serde_json::to_string(board) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize light board: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the current board so no change can fall
    // between the two.
    let mut rx = state.subscribe();
    if !send_board(&mut socket, &state.board()).await {
        debug!("WebSocket client disconnected (initial send failed)");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(board) => {
                        if !send_board(&mut socket, &board).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    // Displays never send anything meaningful.
                    _ => {}
                }
            }
        }
    }
}
