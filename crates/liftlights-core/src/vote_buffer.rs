//! Per-round vote buffer.
//!
//! Holds at most one vote per position for the round in progress. All
//! three positions are always present as keys; a slot is either empty or
//! holds exactly one [`Vote`]. Reads used for quorum detection and
//! broadcast take the same lock as writes, so no caller ever observes a
//! half-updated buffer.

use std::collections::BTreeMap;

use liftlights_types::{Position, Vote};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::RefereeError;

/// Immutable point-in-time copy of the three vote slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSnapshot {
    votes: BTreeMap<Position, Option<Vote>>,
}

impl VoteSnapshot {
    /// The vote held for `position`, if any.
    pub fn get(&self, position: Position) -> Option<Vote> {
        self.votes.get(&position).copied().flatten()
    }

    /// Number of positions holding a vote.
    pub fn votes_in(&self) -> usize {
        self.votes.values().filter(|v| v.is_some()).count()
    }

    /// Whether all three positions hold a vote.
    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }

    /// All three votes in left-center-right order, or `None` while any
    /// slot is still empty.
    pub fn complete(&self) -> Option<[Vote; 3]> {
        Some([
            self.get(Position::Left)?,
            self.get(Position::Center)?,
            self.get(Position::Right)?,
        ])
    }

    /// Iterate the slots in left-center-right order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Option<Vote>)> + '_ {
        self.votes.iter().map(|(p, v)| (*p, *v))
    }
}

/// Votes for the round in progress.
#[derive(Debug)]
pub struct VoteBuffer {
    votes: Mutex<BTreeMap<Position, Option<Vote>>>,
}

impl VoteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            votes: Mutex::new(empty_slots()),
        }
    }

    /// Record `vote` for the position named by `referee`.
    ///
    /// A later vote from the same position in the same round replaces the
    /// earlier one. Registration is not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`RefereeError::InvalidPosition`] if `referee` is not a
    /// position; the buffer is left untouched.
    pub async fn submit_vote(&self, referee: &str, vote: Vote) -> Result<Position, RefereeError> {
        let position: Position = referee.parse()?;

        let mut votes = self.votes.lock().await;
        let previous = votes.insert(position, Some(vote)).flatten();
        if let Some(previous) = previous {
            debug!(%position, %previous, %vote, "vote replaced within round");
        }
        Ok(position)
    }

    /// Whether every position holds a vote.
    pub async fn all_votes_in(&self) -> bool {
        self.votes.lock().await.values().all(Option::is_some)
    }

    /// Number of positions holding a vote.
    pub async fn votes_in(&self) -> usize {
        self.votes
            .lock()
            .await
            .values()
            .filter(|v| v.is_some())
            .count()
    }

    /// Copy the current slots.
    pub async fn snapshot(&self) -> VoteSnapshot {
        VoteSnapshot {
            votes: self.votes.lock().await.clone(),
        }
    }

    /// Empty every slot.
    pub async fn clear(&self) {
        let mut votes = self.votes.lock().await;
        for slot in votes.values_mut() {
            *slot = None;
        }
    }
}

impl Default for VoteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_slots() -> BTreeMap<Position, Option<Vote>> {
    Position::ALL.into_iter().map(|p| (p, None)).collect()
}
