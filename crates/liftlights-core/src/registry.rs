//! Referee position registry.
//!
//! Each of the three positions can be claimed by exactly one station per
//! session. The claimed flags live behind a single mutex so the
//! check-then-claim sequence cannot interleave with another station's
//! registration.

use std::collections::BTreeMap;

use liftlights_types::Position;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::RefereeError;

/// Tracks which referee positions are taken in the current session.
#[derive(Debug)]
pub struct RefereeRegistry {
    claimed: Mutex<BTreeMap<Position, bool>>,
}

impl RefereeRegistry {
    /// Create a registry with every position unclaimed.
    pub fn new() -> Self {
        Self {
            claimed: Mutex::new(Position::ALL.into_iter().map(|p| (p, false)).collect()),
        }
    }

    /// Claim the position named by `referee`.
    ///
    /// Registrations never expire; only [`reset`](Self::reset) frees a
    /// position again.
    ///
    /// # Errors
    ///
    /// - [`RefereeError::InvalidPosition`] if `referee` is not a position.
    /// - [`RefereeError::AlreadyClaimed`] if another station holds it.
    pub async fn register(&self, referee: &str) -> Result<Position, RefereeError> {
        let position: Position = referee.parse()?;

        let mut claimed = self.claimed.lock().await;
        let slot = claimed.entry(position).or_insert(false);
        if *slot {
            debug!(%position, "registration rejected, position already taken");
            return Err(RefereeError::AlreadyClaimed(position));
        }
        *slot = true;

        info!(%position, "referee registered");
        Ok(position)
    }

    /// Release every position.
    pub async fn reset(&self) {
        let mut claimed = self.claimed.lock().await;
        for slot in claimed.values_mut() {
            *slot = false;
        }
    }

    /// Positions currently claimed, in left-center-right order.
    pub async fn claimed(&self) -> Vec<Position> {
        self.claimed
            .lock()
            .await
            .iter()
            .filter_map(|(p, taken)| taken.then_some(*p))
            .collect()
    }

    /// Whether `position` is claimed.
    pub async fn is_claimed(&self, position: Position) -> bool {
        self.claimed
            .lock()
            .await
            .get(&position)
            .copied()
            .unwrap_or(false)
    }
}

impl Default for RefereeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
