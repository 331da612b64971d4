//! Board observer that feeds the referee API state.
//!
//! Every board change from the display loop is stored in [`AppState`]
//! for `GET /api/lights` and broadcast to connected `WebSocket`
//! clients.

use std::sync::Arc;

use liftlights_api::state::AppState;
use liftlights_core::display::BoardObserver;
use liftlights_types::LightBoardState;
use tracing::debug;

/// Observer that bridges the display loop to the referee API.
pub struct BoardCallback {
    state: Arc<AppState>,
}

impl BoardCallback {
    /// Create a new board callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl BoardObserver for BoardCallback {
    fn on_board(&mut self, board: &LightBoardState) {
        let receivers = self.state.publish_board(board);
        debug!(revision = board.revision, receivers, "Light board broadcast sent");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use liftlights_core::{EventChannel, RoundController};
    use liftlights_types::LightColor;

    use super::*;

    #[tokio::test]
    async fn board_updates_reach_state_and_subscribers() {
        let events = Arc::new(EventChannel::new(8));
        let controller = Arc::new(RoundController::new(Duration::from_secs(10), events));
        let state = Arc::new(AppState::new(controller));
        let mut rx = state.subscribe();

        let mut callback = BoardCallback::new(Arc::clone(&state));
        let mut board = LightBoardState::neutral();
        board.right = LightColor::White;
        board.revision = 1;
        callback.on_board(&board);

        assert_eq!(state.board().right, LightColor::White);
        assert_eq!(rx.recv().await.unwrap().revision, 1);
    }
}
