//! Presence domain entities.

pub mod data;
pub mod record;
pub mod room;

pub use data::{OnlineStatus, PresenceData};
pub use record::{EnrichedPresence, PresenceRecord};
pub use room::{GLOBAL_MESSAGES_ROOM, MAX_ROOM_LEN, conversation_room};
