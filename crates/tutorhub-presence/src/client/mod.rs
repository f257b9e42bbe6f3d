//! Client side of the presence engine.
//!
//! A [`PresenceSession`] talks to the service through a [`PresenceApi`],
//! either in-process ([`LocalPresenceApi`]) or over HTTP and WebSocket
//! ([`HttpPresenceApi`]).

pub mod api;
pub mod best_effort;
pub mod http;
pub mod session;
pub mod snapshot;

pub use api::{LocalPresenceApi, PresenceApi, RoomEventStream};
pub use best_effort::best_effort;
pub use http::HttpPresenceApi;
pub use session::{PresenceSession, SessionTimings};
pub use snapshot::{DualRoomPresence, RoomSnapshot};
