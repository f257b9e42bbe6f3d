//! # tutorhub-presence
//!
//! Presence and typing-indicator engine for TutorHub.
//!
//! - [`PresenceService`] records per-room liveness, classifies users as
//!   online from the age of their last write, and publishes room change
//!   events.
//! - [`client::PresenceSession`] runs one session's heartbeat, debounced
//!   writes, typing timeout and reactive room view.
//! - [`consumer`] wires sessions together the way the messages page and
//!   conversation view use them.

pub mod client;
pub mod consumer;
pub mod events;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{DualRoomPresence, PresenceApi, PresenceSession, RoomSnapshot};
pub use events::{RoomEvent, RoomEventHub, RoomSubscription};
pub use service::PresenceService;
