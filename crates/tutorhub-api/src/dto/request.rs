//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Largest accepted presence blob, in bytes.
pub const MAX_PRESENCE_DATA_LEN: u64 = 16 * 1024;

/// `POST /api/presence/update` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePresenceRequest {
    /// Room name.
    #[validate(length(min = 1, max = 255, message = "Room must be 1 to 255 bytes"))]
    pub room: String,
    /// Serialized presence blob; stored as-is.
    #[validate(length(max = MAX_PRESENCE_DATA_LEN, message = "Presence data is too large"))]
    pub data: String,
}

/// Body of the heartbeat and offline endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoomRequest {
    /// Room name.
    #[validate(length(min = 1, max = 255, message = "Room must be 1 to 255 bytes"))]
    pub room: String,
}
