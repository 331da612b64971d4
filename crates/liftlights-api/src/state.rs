//! Shared application state for the referee API.
//!
//! [`AppState`] holds the session's [`RoundController`], the latest copy
//! of the light board published by the display loop, and the broadcast
//! channel that fans board changes out to `WebSocket` clients.

use std::sync::Arc;

use liftlights_core::RoundController;
use liftlights_types::LightBoardState;
use tokio::sync::{broadcast, watch};

/// Capacity of the broadcast channel for light board updates.
///
/// A subscriber that falls behind by more than this many messages
/// receives [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The referee session every write endpoint acts on.
    pub controller: Arc<RoundController>,
    /// Light board as last reported by the display loop.
    pub board: Arc<watch::Sender<LightBoardState>>,
    /// Broadcast sender for light board updates.
    pub tx: broadcast::Sender<LightBoardState>,
}

impl AppState {
    /// Create state around `controller` with a dark board.
    pub fn new(controller: Arc<RoundController>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            controller,
            board: Arc::new(watch::Sender::new(LightBoardState::neutral())),
            tx,
        }
    }

    /// Subscribe to light board updates.
    pub fn subscribe(&self) -> broadcast::Receiver<LightBoardState> {
        self.tx.subscribe()
    }

    /// Current light board.
    pub fn board(&self) -> LightBoardState {
        self.board.borrow().clone()
    }

    /// Store `board` as the current light board and push it to every
    /// connected `WebSocket` client.
    ///
    /// Returns the number of receivers that got the update (0 when no
    /// client is connected).
    pub fn publish_board(&self, board: &LightBoardState) -> usize {
        self.board.send_replace(board.clone());
        // Err only means nobody is subscribed.
        self.tx.send(board.clone()).unwrap_or(0)
    }
}
