//! Display side of the light protocol.
//!
//! [`LightBoard`] folds [`LightEvent`]s into the three lamp colors, and
//! [`run_display`] is the consumer loop: on every poll it drains the
//! [`EventChannel`], applies the batch, and hands the board to a
//! [`BoardObserver`] when something changed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use liftlights_types::{LightBoardState, LightColor, LightEvent, Position};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::event_channel::EventChannel;

/// Callback invoked whenever the board changes.
///
/// The engine uses this to push the board to HTTP and `WebSocket`
/// clients.
pub trait BoardObserver: Send {
    /// Called with the board after a batch of events changed it, and
    /// once with the initial board when the display starts.
    fn on_board(&mut self, board: &LightBoardState);
}

/// An observer that ignores every update.
pub struct NoOpObserver;

impl BoardObserver for NoOpObserver {
    fn on_board(&mut self, _board: &LightBoardState) {}
}

/// The three lamps as last set by the event stream.
#[derive(Debug, Clone, Default)]
pub struct LightBoard {
    state: LightBoardState,
}

impl LightBoard {
    /// A dark board: every lamp neutral.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Returns `true` if any lamp changed color.
    fn apply(&mut self, event: &LightEvent) -> bool {
        match *event {
            LightEvent::Set { position, vote } => self.paint(position, LightColor::from(vote)),
            LightEvent::ResetAll => Position::ALL
                .into_iter()
                .fold(false, |changed, p| self.paint(p, LightColor::Neutral) || changed),
        }
    }

    /// Apply a batch in order.
    ///
    /// The revision advances at most once per batch, and only if the
    /// batch left a lamp in a different color than before.
    pub fn apply_all<'a, I>(&mut self, events: I) -> bool
    where
        I: IntoIterator<Item = &'a LightEvent>,
    {
        let before = (self.state.left, self.state.center, self.state.right);
        for event in events {
            self.apply(event);
        }
        let changed = before != (self.state.left, self.state.center, self.state.right);
        if changed {
            self.state.revision = self.state.revision.saturating_add(1);
            self.state.updated_at = Utc::now();
        }
        changed
    }

    /// Current lamp colors.
    pub const fn state(&self) -> &LightBoardState {
        &self.state
    }

    fn paint(&mut self, position: Position, color: LightColor) -> bool {
        let lamp = match position {
            Position::Left => &mut self.state.left,
            Position::Center => &mut self.state.center,
            Position::Right => &mut self.state.right,
        };
        let changed = *lamp != color;
        *lamp = color;
        changed
    }
}

/// Consume light events until `shutdown` flips to `true` or its sender
/// goes away.
///
/// Events are drained every `poll_interval`; all events pending at a
/// poll are applied in arrival order before the observer is told. Returns
/// the board as it stood when the loop stopped.
pub async fn run_display(
    events: Arc<EventChannel>,
    mut board: LightBoard,
    poll_interval: Duration,
    observer: &mut dyn BoardObserver,
    mut shutdown: watch::Receiver<bool>,
) -> LightBoard {
    info!(
        poll_interval_ms = poll_interval.as_millis(),
        "light display started"
    );
    observer.on_board(board.state());

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let batch = events.drain_pending().await;
                if batch.is_empty() {
                    continue;
                }
                if board.apply_all(&batch) {
                    let state = board.state();
                    debug!(
                        events = batch.len(),
                        revision = state.revision,
                        left = state.left.css_name(),
                        center = state.center.css_name(),
                        right = state.right.css_name(),
                        "light board updated"
                    );
                    observer.on_board(state);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!(revision = board.state().revision, "light display stopped");
    board
}
