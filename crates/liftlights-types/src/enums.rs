//! Enumeration types for the referee lights service.
//!
//! Referee identifiers and button names arrive as free-form strings from
//! the stations. The [`FromStr`] implementations here are the only place
//! those strings are interpreted: surrounding whitespace is ignored and
//! matching is ASCII case-insensitive.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// One of the three fixed referee slots around the platform.
///
/// The declaration order is the stable broadcast order used everywhere
/// (left, center, right) and is what [`Ord`] compares by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Position {
    /// Side referee on the lifter's right, displayed on the left.
    Left,
    /// Head referee.
    Center,
    /// Side referee displayed on the right.
    Right,
}

impl Position {
    /// Every position in stable broadcast order.
    pub const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    /// The wire name of this position.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A referee identifier that does not name one of the three positions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown referee position: {0:?}")]
pub struct UnknownPosition(pub String);

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownPosition(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

/// A referee decision for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Vote {
    /// No lift.
    Red,
    /// Good lift.
    White,
}

impl Vote {
    /// The wire name of this vote (also the button name).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::White => "white",
        }
    }

    /// Whether this vote passes the lift.
    pub const fn is_good_lift(self) -> bool {
        matches!(self, Self::White)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A button name that is neither `red` nor `white`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vote color: {0:?}")]
pub struct UnknownVote(pub String);

impl FromStr for Vote {
    type Err = UnknownVote;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("red") {
            Ok(Self::Red)
        } else if trimmed.eq_ignore_ascii_case("white") {
            Ok(Self::White)
        } else {
            Err(UnknownVote(s.to_owned()))
        }
    }
}

// ---------------------------------------------------------------------------
// Indicator colors
// ---------------------------------------------------------------------------

/// Color currently shown by one indicator on the light board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LightColor {
    /// Unlit; the board's resting state.
    #[default]
    Neutral,
    /// Showing a no-lift decision.
    Red,
    /// Showing a good-lift decision.
    White,
}

impl LightColor {
    /// CSS/Tk color name a renderer should fill the indicator with.
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Neutral => "grey20",
            Self::Red => "red",
            Self::White => "white",
        }
    }
}

impl From<Vote> for LightColor {
    fn from(vote: Vote) -> Self {
        match vote {
            Vote::Red => Self::Red,
            Vote::White => Self::White,
        }
    }
}

// ---------------------------------------------------------------------------
// Round state
// ---------------------------------------------------------------------------

/// Where the current round is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RoundState {
    /// No votes recorded for this round.
    Idle,
    /// One or two positions have voted.
    Collecting,
    /// All three positions have voted and the result is being broadcast.
    Complete,
}

impl RoundState {
    /// Derive the state from the number of positions holding a vote.
    pub const fn from_votes_in(votes_in: usize) -> Self {
        match votes_in {
            0 => Self::Idle,
            1 | 2 => Self::Collecting,
            _ => Self::Complete,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn position_parse_is_case_insensitive() {
        assert_eq!("LEFT".parse::<Position>().unwrap(), Position::Left);
        assert_eq!(" Center ".parse::<Position>().unwrap(), Position::Center);
        assert_eq!("right".parse::<Position>().unwrap(), Position::Right);
    }

    #[test]
    fn position_parse_rejects_unknown() {
        let err = "top".parse::<Position>().unwrap_err();
        assert_eq!(err, UnknownPosition(String::from("top")));
        assert!("".parse::<Position>().is_err());
    }

    #[test]
    fn positions_order_left_to_right() {
        let mut shuffled = [Position::Right, Position::Left, Position::Center];
        shuffled.sort();
        assert_eq!(shuffled, Position::ALL);
    }

    #[test]
    fn vote_parse() {
        assert_eq!("Red".parse::<Vote>().unwrap(), Vote::Red);
        assert_eq!("WHITE".parse::<Vote>().unwrap(), Vote::White);
        assert!("green".parse::<Vote>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Position::Center).unwrap(), "\"center\"");
        assert_eq!(serde_json::to_string(&Vote::White).unwrap(), "\"white\"");
        assert_eq!(
            serde_json::to_string(&RoundState::Collecting).unwrap(),
            "\"collecting\""
        );
    }

    #[test]
    fn light_color_from_vote() {
        assert_eq!(LightColor::from(Vote::Red), LightColor::Red);
        assert_eq!(LightColor::from(Vote::White), LightColor::White);
        assert_eq!(LightColor::default().css_name(), "grey20");
    }

    #[test]
    fn round_state_from_count() {
        assert_eq!(RoundState::from_votes_in(0), RoundState::Idle);
        assert_eq!(RoundState::from_votes_in(2), RoundState::Collecting);
        assert_eq!(RoundState::from_votes_in(3), RoundState::Complete);
    }
}
