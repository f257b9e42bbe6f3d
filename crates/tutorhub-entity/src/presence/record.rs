//! Stored and enriched presence records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tutorhub_core::types::UserId;

use super::data::PresenceData;

/// One row per (user, room): the latest blob and liveness timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    /// Owner of the record.
    pub user_id: UserId,
    /// Partition key.
    pub room: String,
    /// Serialized [`PresenceData`].
    pub data: String,
    /// Epoch milliseconds of the last write attributed to this user here.
    pub last_seen: i64,
}

impl PresenceRecord {
    /// Build a record.
    pub fn new(
        user_id: UserId,
        room: impl Into<String>,
        data: impl Into<String>,
        last_seen: i64,
    ) -> Self {
        Self {
            user_id,
            room: room.into(),
            data: data.into(),
            last_seen,
        }
    }

    /// Whether the record counts as online at `now` for the given threshold.
    pub fn is_online_at(&self, now: i64, threshold_ms: i64) -> bool {
        now - self.last_seen < threshold_ms
    }

    /// Parsed blob; malformed blobs read as empty.
    pub fn presence_data(&self) -> PresenceData {
        PresenceData::parse_lenient(&self.data)
    }
}

/// A record as returned to other participants of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPresence {
    /// Owner of the record.
    pub user_id: UserId,
    /// Display name of the owner.
    pub user_name: String,
    /// Serialized [`PresenceData`], passed through untouched.
    pub data: String,
    /// Epoch milliseconds of last activity.
    pub last_seen: i64,
    /// Classified at query time from `last_seen`.
    pub is_online: bool,
}

impl EnrichedPresence {
    /// Parsed blob; malformed blobs read as empty.
    pub fn presence_data(&self) -> PresenceData {
        PresenceData::parse_lenient(&self.data)
    }

    /// Online and currently flagged as typing.
    pub fn is_typing(&self) -> bool {
        self.is_online && self.presence_data().is_typing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_boundary_is_exclusive() {
        let record = PresenceRecord::new(UserId::new(), "global-messages", "{}", 10_000);
        assert!(record.is_online_at(14_999, 5_000));
        assert!(!record.is_online_at(15_000, 5_000));
    }

    #[test]
    fn test_enriched_wire_shape() {
        let user_id = UserId::new();
        let enriched = EnrichedPresence {
            user_id,
            user_name: "Ada Lovelace".to_string(),
            data: r#"{"typing":true}"#.to_string(),
            last_seen: 42,
            is_online: true,
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["userId"], serde_json::json!(user_id.to_string()));
        assert_eq!(value["userName"], "Ada Lovelace");
        assert_eq!(value["lastSeen"], 42);
        assert_eq!(value["isOnline"], true);
    }

    #[test]
    fn test_typing_requires_online() {
        let mut enriched = EnrichedPresence {
            user_id: UserId::new(),
            user_name: "Ada".to_string(),
            data: r#"{"typing":true}"#.to_string(),
            last_seen: 0,
            is_online: true,
        };
        assert!(enriched.is_typing());
        enriched.is_online = false;
        assert!(!enriched.is_typing());
        enriched.is_online = true;
        enriched.data = "{broken".to_string();
        assert!(!enriched.is_typing());
    }
}
