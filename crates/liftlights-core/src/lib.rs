//! Session state and event plumbing for the referee lights service.
//!
//! Three referee stations register for a position and vote red or white
//! on each lift. Once all three votes are in, the decision is published
//! to the display as a batch of light events and the lamps are turned
//! off again after a configurable delay.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `liftlights.yaml` into
//!   strongly-typed structs.
//! - [`controller`] -- [`RoundController`], the per-session coordinator.
//! - [`display`] -- [`LightBoard`] and the [`run_display`] consumer loop.
//! - [`error`] -- [`RefereeError`] for rejected registrations and votes.
//! - [`event_channel`] -- Bounded producer/consumer queue of light events.
//! - [`registry`] -- One-station-per-position registration.
//! - [`reset_timer`] -- Cancellable delayed auto-reset.
//! - [`vote_buffer`] -- Per-round vote slots.
//!
//! [`RoundController`]: controller::RoundController
//! [`LightBoard`]: display::LightBoard
//! [`run_display`]: display::run_display
//! [`RefereeError`]: error::RefereeError

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod event_channel;
pub mod registry;
pub mod reset_timer;
pub mod vote_buffer;

pub use controller::{ResetReport, RoundController, SessionStatus, VoteReceipt};
pub use error::RefereeError;
pub use event_channel::EventChannel;
