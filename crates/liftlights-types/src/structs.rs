//! Structured values exchanged between the round controller, the display
//! consumer and API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{LightColor, Position, Vote};
use crate::ids::SessionId;

// ---------------------------------------------------------------------------
// Light events
// ---------------------------------------------------------------------------

/// A single instruction for the rendering surface.
///
/// Produced by the round controller (on quorum and on manual reset) and
/// by the auto-reset timer. Consumed in order by the display loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LightEvent {
    /// Light one indicator with a referee's vote.
    Set {
        /// The indicator to change.
        position: Position,
        /// The vote to show.
        vote: Vote,
    },
    /// Return every indicator to neutral.
    ResetAll,
}

impl LightEvent {
    /// Shorthand for [`LightEvent::Set`].
    pub const fn set(position: Position, vote: Vote) -> Self {
        Self::Set { position, vote }
    }
}

// ---------------------------------------------------------------------------
// Light board
// ---------------------------------------------------------------------------

/// Point-in-time view of the three indicators.
///
/// `revision` increases by one every time the display loop changes any
/// indicator, so clients can discard stale frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LightBoardState {
    /// Left indicator.
    pub left: LightColor,
    /// Center indicator.
    pub center: LightColor,
    /// Right indicator.
    pub right: LightColor,
    /// Monotonic change counter.
    pub revision: u64,
    /// When the board last changed.
    pub updated_at: DateTime<Utc>,
}

impl LightBoardState {
    /// A dark board at revision zero.
    pub fn neutral() -> Self {
        Self {
            left: LightColor::Neutral,
            center: LightColor::Neutral,
            right: LightColor::Neutral,
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// Color currently shown at `position`.
    pub const fn color(&self, position: Position) -> LightColor {
        match position {
            Position::Left => self.left,
            Position::Center => self.center,
            Position::Right => self.right,
        }
    }

    /// Whether every indicator is neutral.
    pub fn is_dark(&self) -> bool {
        Position::ALL
            .into_iter()
            .all(|p| self.color(p) == LightColor::Neutral)
    }
}

impl Default for LightBoardState {
    fn default() -> Self {
        Self::neutral()
    }
}

// ---------------------------------------------------------------------------
// Round outcome
// ---------------------------------------------------------------------------

/// The decision reached when all three referees have voted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundOutcome {
    /// Session the round belongs to.
    pub session_id: SessionId,
    /// 1-based round number within the session.
    pub round: u64,
    /// Left referee's vote.
    pub left: Vote,
    /// Center referee's vote.
    pub center: Vote,
    /// Right referee's vote.
    pub right: Vote,
    /// Number of white lights.
    pub white_votes: usize,
    /// Whether the majority (two or more whites) passed the lift.
    pub good_lift: bool,
    /// When quorum was reached.
    pub completed_at: DateTime<Utc>,
}

impl RoundOutcome {
    /// Build an outcome from the three votes, computing the verdict.
    pub fn new(
        session_id: SessionId,
        round: u64,
        [left, center, right]: [Vote; 3],
        completed_at: DateTime<Utc>,
    ) -> Self {
        let white_votes = [left, center, right]
            .into_iter()
            .filter(|v| v.is_good_lift())
            .count();
        Self {
            session_id,
            round,
            left,
            center,
            right,
            white_votes,
            good_lift: white_votes >= 2,
            completed_at,
        }
    }

    /// The vote cast at `position`.
    pub const fn vote(&self, position: Position) -> Vote {
        match position {
            Position::Left => self.left,
            Position::Center => self.center,
            Position::Right => self.right,
        }
    }
}
