//! Room event payloads, also used as the WebSocket wire format.

use serde::{Deserialize, Serialize};

use tutorhub_core::types::UserId;

/// A change to the presence rows of one room.
///
/// Events carry no presence data. Subscribers re-query the room, so a
/// dropped or coalesced event only delays a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A user replaced their presence blob.
    Updated {
        /// Room name.
        room: String,
        /// Writer.
        user_id: UserId,
        /// New `last_seen`.
        at: i64,
    },
    /// A user refreshed `last_seen` only.
    Heartbeat {
        /// Room name.
        room: String,
        /// Writer.
        user_id: UserId,
        /// New `last_seen`.
        at: i64,
    },
    /// A user was forced offline.
    WentOffline {
        /// Room name.
        room: String,
        /// Affected user.
        user_id: UserId,
    },
    /// A stale row was removed by the cleanup sweep.
    Removed {
        /// Room name.
        room: String,
        /// Affected user.
        user_id: UserId,
    },
    /// The subscriber fell behind and missed events.
    Resync {
        /// Room name.
        room: String,
    },
}

impl RoomEvent {
    /// Room this event belongs to.
    pub fn room(&self) -> &str {
        match self {
            Self::Updated { room, .. }
            | Self::Heartbeat { room, .. }
            | Self::WentOffline { room, .. }
            | Self::Removed { room, .. }
            | Self::Resync { room } => room,
        }
    }

    /// User whose row changed, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Updated { user_id, .. }
            | Self::Heartbeat { user_id, .. }
            | Self::WentOffline { user_id, .. }
            | Self::Removed { user_id, .. } => Some(*user_id),
            Self::Resync { .. } => None,
        }
    }
}
