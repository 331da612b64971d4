//! Round lifecycle for one referee session.
//!
//! [`RoundController`] is the session object: it owns the registry, the
//! vote buffer, the auto-reset timer and a handle to the event channel,
//! and is shared by every request handler through an [`Arc`].
//!
//! # Round states
//!
//! ```text
//!   Idle --vote--> Collecting --vote--> ... --3rd vote--> Complete
//!    ^                                                      |
//!    +---------- broadcast, arm auto-reset, clear ----------+
//!
//!   any state --manual reset--> Idle (new session)
//! ```
//!
//! Votes and manual resets are serialised by the round ledger lock, so
//! the quorum check, snapshot, broadcast, timer arming and clear run as
//! one unit. Registration only touches the registry's own lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use liftlights_types::{LightEvent, Position, RoundOutcome, RoundState, SessionId, Vote};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::RoundConfig;
use crate::error::RefereeError;
use crate::event_channel::EventChannel;
use crate::registry::RefereeRegistry;
use crate::reset_timer::ResetTimer;
use crate::vote_buffer::VoteBuffer;

/// Acknowledgement for an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// Position the vote was recorded for.
    pub position: Position,
    /// The recorded vote.
    pub vote: Vote,
    /// Positions holding a vote right after this one was recorded
    /// (3 when this vote completed the round).
    pub votes_in: usize,
    /// Round state right after this vote.
    pub round_state: RoundState,
    /// The decision, when this vote completed the round.
    pub outcome: Option<RoundOutcome>,
}

/// What a manual reset did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReport {
    /// Session that was closed.
    pub previous_session_id: SessionId,
    /// Session that starts now.
    pub session_id: SessionId,
    /// Whether a pending auto-reset was cancelled.
    pub timer_cancelled: bool,
    /// Unconsumed light events thrown away.
    pub discarded_events: usize,
}

/// Snapshot of the session for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Current session.
    pub session_id: SessionId,
    /// When the current session started.
    pub session_started_at: DateTime<Utc>,
    /// Where the current round is.
    pub round_state: RoundState,
    /// Registered positions, left to right.
    pub registered: Vec<Position>,
    /// Positions that have voted this round.
    pub votes_in: usize,
    /// Rounds decided in this session.
    pub rounds_completed: u64,
    /// Whether an auto-reset is scheduled.
    pub reset_pending: bool,
    /// Configured auto-reset delay in milliseconds.
    pub reset_delay_ms: u64,
    /// Most recent decision in this session.
    pub last_outcome: Option<RoundOutcome>,
    /// Light events not yet taken by the display.
    pub pending_events: usize,
    /// Light events evicted because the display fell behind.
    pub dropped_events: u64,
}

#[derive(Debug)]
struct RoundLedger {
    session_id: SessionId,
    session_started_at: DateTime<Utc>,
    rounds_completed: u64,
    last_outcome: Option<RoundOutcome>,
}

impl RoundLedger {
    fn new() -> Self {
        Self {
            session_id: SessionId::new(),
            session_started_at: Utc::now(),
            rounds_completed: 0,
            last_outcome: None,
        }
    }
}

/// Coordinates registration, voting, broadcast and reset for a session.
#[derive(Debug)]
pub struct RoundController {
    registry: RefereeRegistry,
    votes: VoteBuffer,
    timer: ResetTimer,
    events: Arc<EventChannel>,
    reset_delay: Duration,
    ledger: Mutex<RoundLedger>,
}

impl RoundController {
    /// Create a controller that publishes to `events` and turns the
    /// lights off `reset_delay` after each decision.
    pub fn new(reset_delay: Duration, events: Arc<EventChannel>) -> Self {
        let ledger = RoundLedger::new();
        info!(
            session_id = %ledger.session_id,
            reset_delay_ms = reset_delay.as_millis(),
            "referee session started"
        );
        Self {
            registry: RefereeRegistry::new(),
            votes: VoteBuffer::new(),
            timer: ResetTimer::new(),
            events,
            reset_delay,
            ledger: Mutex::new(ledger),
        }
    }

    /// Create a controller from the `round` config section.
    pub fn from_config(config: &RoundConfig, events: Arc<EventChannel>) -> Self {
        Self::new(config.reset_delay(), events)
    }

    /// The channel this controller publishes light events to.
    pub const fn events(&self) -> &Arc<EventChannel> {
        &self.events
    }

    /// Claim a referee position for the calling station.
    ///
    /// # Errors
    ///
    /// See [`RefereeRegistry::register`].
    pub async fn register(&self, referee: &str) -> Result<Position, RefereeError> {
        self.registry.register(referee).await
    }

    /// Record a vote and, if it completes the round, broadcast the result.
    ///
    /// The quorum check reads one snapshot of the buffer taken under the
    /// ledger lock. On quorum the three votes are published as one
    /// contiguous batch in left-center-right order, the auto-reset is (re-)armed, and only
    /// then is the buffer cleared for the next attempt.
    ///
    /// # Errors
    ///
    /// - [`RefereeError::InvalidColor`] if `button` is not `red`/`white`.
    /// - [`RefereeError::InvalidPosition`] if `referee` is not a position.
    ///
    /// A rejected vote changes nothing.
    pub async fn submit_vote(
        &self,
        referee: &str,
        button: &str,
    ) -> Result<VoteReceipt, RefereeError> {
        let vote: Vote = button.parse()?;

        let mut ledger = self.ledger.lock().await;
        let position = self.votes.submit_vote(referee, vote).await?;

        let snapshot = self.votes.snapshot().await;
        let Some(decided) = snapshot.complete() else {
            let votes_in = snapshot.votes_in();
            debug!(%position, %vote, votes_in, "vote recorded");
            return Ok(VoteReceipt {
                position,
                vote,
                votes_in,
                round_state: RoundState::from_votes_in(votes_in),
                outcome: None,
            });
        };

        self.events
            .publish_batch(
                Position::ALL
                    .into_iter()
                    .zip(decided)
                    .map(|(p, v)| LightEvent::set(p, v)),
            )
            .await;

        let events = Arc::clone(&self.events);
        self.timer
            .arm(self.reset_delay, async move {
                events.publish(LightEvent::ResetAll).await;
                info!("lights auto-reset");
            })
            .await;

        self.votes.clear().await;

        ledger.rounds_completed = ledger.rounds_completed.saturating_add(1);
        let outcome = RoundOutcome::new(
            ledger.session_id,
            ledger.rounds_completed,
            decided,
            Utc::now(),
        );
        ledger.last_outcome = Some(outcome.clone());

        info!(
            session_id = %outcome.session_id,
            round = outcome.round,
            left = %outcome.left,
            center = %outcome.center,
            right = %outcome.right,
            good_lift = outcome.good_lift,
            "round decided"
        );

        Ok(VoteReceipt {
            position,
            vote,
            votes_in: Position::ALL.len(),
            round_state: RoundState::Complete,
            outcome: Some(outcome),
        })
    }

    /// Return every component to its starting state and start a new session.
    ///
    /// Releases all positions, clears the buffer, cancels a pending
    /// auto-reset, discards unconsumed light events and enqueues a single
    /// [`LightEvent::ResetAll`] so the display goes dark immediately.
    pub async fn reset(&self) -> ResetReport {
        let mut ledger = self.ledger.lock().await;

        self.registry.reset().await;
        self.votes.clear().await;
        let timer_cancelled = self.timer.cancel().await;
        let discarded_events = self.events.replace_pending(LightEvent::ResetAll).await;

        let previous_session_id = ledger.session_id;
        *ledger = RoundLedger::new();

        info!(
            %previous_session_id,
            session_id = %ledger.session_id,
            timer_cancelled,
            discarded_events,
            "manual reset"
        );

        ResetReport {
            previous_session_id,
            session_id: ledger.session_id,
            timer_cancelled,
            discarded_events,
        }
    }

    /// Current session status.
    pub async fn status(&self) -> SessionStatus {
        let ledger = self.ledger.lock().await;
        let votes_in = self.votes.votes_in().await;

        SessionStatus {
            session_id: ledger.session_id,
            session_started_at: ledger.session_started_at,
            round_state: RoundState::from_votes_in(votes_in),
            registered: self.registry.claimed().await,
            votes_in,
            rounds_completed: ledger.rounds_completed,
            reset_pending: self.timer.is_pending().await,
            reset_delay_ms: u64::try_from(self.reset_delay.as_millis()).unwrap_or(u64::MAX),
            last_outcome: ledger.last_outcome.clone(),
            pending_events: self.events.len().await,
            dropped_events: self.events.dropped_count(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use tokio::time::sleep;

    use super::*;

    const DELAY: Duration = Duration::from_secs(10);

    fn make_controller() -> RoundController {
        RoundController::new(DELAY, Arc::new(EventChannel::new(64)))
    }

    async fn register_all(controller: &RoundController) {
        for referee in ["left", "center", "right"] {
            controller.register(referee).await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quorum_broadcasts_in_position_order() {
        let controller = make_controller();
        register_all(&controller).await;

        let receipt = controller.submit_vote("left", "red").await.unwrap();
        assert_eq!(receipt.round_state, RoundState::Collecting);
        let receipt = controller.submit_vote("center", "white").await.unwrap();
        assert_eq!(receipt.votes_in, 2);
        assert!(receipt.outcome.is_none());
        assert!(controller.events().is_empty().await);

        let receipt = controller.submit_vote("right", "red").await.unwrap();
        assert_eq!(receipt.round_state, RoundState::Complete);
        let outcome = receipt.outcome.unwrap();
        assert_eq!(outcome.round, 1);
        assert!(!outcome.good_lift);

        assert_eq!(
            controller.events().drain_pending().await,
            vec![
                LightEvent::set(Position::Left, Vote::Red),
                LightEvent::set(Position::Center, Vote::White),
                LightEvent::set(Position::Right, Vote::Red),
            ]
        );

        let status = controller.status().await;
        assert_eq!(status.votes_in, 0);
        assert_eq!(status.round_state, RoundState::Idle);
        assert!(status.reset_pending);
        assert_eq!(status.rounds_completed, 1);
        assert_eq!(status.last_outcome, Some(outcome));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_reset_fires_after_delay() {
        let controller = make_controller();
        for (referee, button) in [("left", "white"), ("center", "white"), ("right", "white")] {
            controller.submit_vote(referee, button).await.unwrap();
        }
        controller.events().drain_pending().await;

        sleep(DELAY - Duration::from_millis(1)).await;
        assert!(controller.events().is_empty().await);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(controller.events().drain_pending().await, vec![LightEvent::ResetAll]);
        assert!(!controller.status().await.reset_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reset_cancels_auto_reset() {
        let controller = make_controller();
        register_all(&controller).await;
        for (referee, button) in [("left", "red"), ("center", "white"), ("right", "red")] {
            controller.submit_vote(referee, button).await.unwrap();
        }
        let before = controller.status().await.session_id;

        sleep(Duration::from_secs(3)).await;
        let report = controller.reset().await;
        assert!(report.timer_cancelled);
        assert_eq!(report.discarded_events, 3);
        assert_eq!(report.previous_session_id, before);
        assert_ne!(report.session_id, before);

        let status = controller.status().await;
        assert!(status.registered.is_empty());
        assert_eq!(status.votes_in, 0);
        assert!(!status.reset_pending);
        assert_eq!(status.rounds_completed, 0);
        assert!(status.last_outcome.is_none());

        assert_eq!(controller.events().drain_pending().await, vec![LightEvent::ResetAll]);

        sleep(DELAY * 3).await;
        assert!(controller.events().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reset_while_collecting() {
        let controller = make_controller();
        register_all(&controller).await;
        controller.submit_vote("center", "white").await.unwrap();

        let report = controller.reset().await;
        assert!(!report.timer_cancelled);
        assert_eq!(report.discarded_events, 0);

        let status = controller.status().await;
        assert_eq!(status.round_state, RoundState::Idle);
        assert!(status.registered.is_empty());
        assert_eq!(controller.events().drain_pending().await, vec![LightEvent::ResetAll]);

        // Positions are free again.
        assert!(controller.register("center").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_rounds_reset_once() {
        let controller = make_controller();
        let round = [("left", "white"), ("center", "red"), ("right", "white")];

        for (referee, button) in round {
            controller.submit_vote(referee, button).await.unwrap();
        }
        sleep(Duration::from_secs(5)).await;
        for (referee, button) in round {
            controller.submit_vote(referee, button).await.unwrap();
        }

        // Past the first round's deadline: nothing yet.
        sleep(Duration::from_secs(6)).await;
        let events = controller.events().drain_pending().await;
        assert_eq!(events.len(), 6);
        assert!(!events.contains(&LightEvent::ResetAll));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(controller.events().drain_pending().await, vec![LightEvent::ResetAll]);

        sleep(DELAY * 2).await;
        assert!(controller.events().is_empty().await);
        assert_eq!(controller.status().await.rounds_completed, 2);
    }

    #[tokio::test]
    async fn undersized_channel_keeps_every_light_of_a_round() {
        let controller = RoundController::new(DELAY, Arc::new(EventChannel::new(2)));
        for (referee, button) in [("left", "red"), ("center", "white"), ("right", "red")] {
            controller.submit_vote(referee, button).await.unwrap();
        }

        assert_eq!(controller.events().dropped_count(), 0);
        assert_eq!(
            controller.events().drain_pending().await,
            vec![
                LightEvent::set(Position::Left, Vote::Red),
                LightEvent::set(Position::Center, Vote::White),
                LightEvent::set(Position::Right, Vote::Red),
            ]
        );
    }

    #[tokio::test]
    async fn padded_referee_name_votes_for_that_position() {
        let controller = make_controller();
        let receipt = controller.submit_vote(" left ", "white").await.unwrap();
        assert_eq!(receipt.position, Position::Left);
        assert_eq!(controller.status().await.votes_in, 1);
    }

    #[tokio::test]
    async fn invalid_color_changes_nothing() {
        let controller = make_controller();
        controller.submit_vote("left", "red").await.unwrap();

        let result = controller.submit_vote("center", "green").await;
        assert_eq!(result, Err(RefereeError::InvalidColor(String::from("green"))));
        assert_eq!(controller.status().await.votes_in, 1);
    }

    #[tokio::test]
    async fn unknown_position_changes_nothing() {
        let controller = make_controller();
        controller.submit_vote("left", "red").await.unwrap();

        let result = controller.submit_vote("top", "white").await;
        assert_eq!(result, Err(RefereeError::InvalidPosition(String::from("top"))));
        let status = controller.status().await;
        assert_eq!(status.votes_in, 1);
        assert!(controller.events().is_empty().await);
    }

    #[tokio::test]
    async fn unregistered_station_may_vote() {
        let controller = make_controller();
        let receipt = controller.submit_vote("right", "white").await.unwrap();
        assert_eq!(receipt.position, Position::Right);
        assert!(controller.status().await.registered.is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let controller = make_controller();
        controller.register("left").await.unwrap();
        assert_eq!(
            controller.register("left").await,
            Err(RefereeError::AlreadyClaimed(Position::Left))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_broadcast_once_per_round() {
        let controller = Arc::new(make_controller());

        for _ in 0..50 {
            let mut handles = Vec::new();
            for referee in ["left", "center", "right"] {
                let controller = Arc::clone(&controller);
                handles.push(tokio::spawn(async move {
                    controller.submit_vote(referee, "white").await
                }));
            }
            let mut completions = 0_usize;
            for handle in handles {
                if handle.await.unwrap().unwrap().outcome.is_some() {
                    completions = completions.saturating_add(1);
                }
            }
            assert_eq!(completions, 1);
            assert_eq!(controller.status().await.votes_in, 0);
        }

        let events = controller.events().drain_pending().await;
        assert_eq!(events.len(), 150);
        for triple in events.chunks(3) {
            assert_eq!(
                triple,
                Position::ALL.map(|p| LightEvent::set(p, Vote::White)).as_slice()
            );
        }
        assert_eq!(controller.status().await.rounds_completed, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn contended_votes_only_emit_whole_rounds() {
        let controller = Arc::new(RoundController::new(DELAY, Arc::new(EventChannel::new(1024))));
        let mut handles = Vec::new();
        for i in 0..90_usize {
            let controller = Arc::clone(&controller);
            let referee = Position::ALL
                .get(i % 3)
                .copied()
                .unwrap_or(Position::Left)
                .as_str();
            let button = if i % 2 == 0 { "red" } else { "white" };
            handles.push(tokio::spawn(async move {
                controller.submit_vote(referee, button).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let status = controller.status().await;
        let events = controller.events().drain_pending().await;
        let rounds = usize::try_from(status.rounds_completed).unwrap();
        assert_eq!(events.len(), rounds * 3);
        for triple in events.chunks(3) {
            let positions: Vec<Position> = triple
                .iter()
                .filter_map(|e| match e {
                    LightEvent::Set { position, .. } => Some(*position),
                    LightEvent::ResetAll => None,
                })
                .collect();
            assert_eq!(positions, Position::ALL.to_vec());
        }
        assert!(status.votes_in < 3);
    }
}
