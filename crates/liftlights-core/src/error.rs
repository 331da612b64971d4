//! Rejection reasons for referee requests.
//!
//! Every variant is recoverable and local to the request that caused it.
//! None of them leave the registry, the vote buffer or the round ledger
//! in a modified state.

use liftlights_types::{Position, UnknownPosition, UnknownVote};

/// Why a registration, vote or request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefereeError {
    /// The referee identifier is not `left`, `center` or `right`.
    #[error("Invalid referee: {0:?}")]
    InvalidPosition(String),

    /// The position was already registered in this session.
    #[error("Position already taken: {0}")]
    AlreadyClaimed(Position),

    /// The button is neither `red` nor `white`.
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    /// The request asked for an action other than `register` or `vote`.
    #[error("Invalid action: {0:?}")]
    InvalidAction(String),
}

impl From<UnknownPosition> for RefereeError {
    fn from(err: UnknownPosition) -> Self {
        Self::InvalidPosition(err.0)
    }
}

impl From<UnknownVote> for RefereeError {
    fn from(err: UnknownVote) -> Self {
        Self::InvalidColor(err.0)
    }
}
