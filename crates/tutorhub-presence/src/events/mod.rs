//! Room change notifications.

pub mod hub;
pub mod types;

pub use hub::{RoomEventHub, RoomSubscription};
pub use types::RoomEvent;
