//! Shared type definitions for the referee lights service.
//!
//! This crate is the single source of truth for the values that cross
//! crate and process boundaries: referee positions, votes, light events
//! and the light board projection served to display clients. Types
//! defined here flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for session identifiers
//! - [`enums`] -- Positions, votes, indicator colors and round states
//! - [`structs`] -- Light events, board state and round outcomes

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{LightColor, Position, RoundState, UnknownPosition, UnknownVote, Vote};
pub use ids::SessionId;
pub use structs::{LightBoardState, LightEvent, RoundOutcome};
