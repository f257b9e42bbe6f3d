//! In-memory presence store.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use tutorhub_core::result::AppResult;
use tutorhub_core::types::UserId;
use tutorhub_entity::presence::PresenceRecord;

use crate::store::PresenceStore;

/// Presence rows grouped by room.
///
/// The outer map is the room index; the inner map is keyed by user, so a
/// (room, user) write happens under the room's shard lock and is atomic.
#[derive(Debug, Default)]
pub struct MemoryPresenceStore {
    rooms: DashMap<String, HashMap<UserId, PresenceRecord>>,
}

impl MemoryPresenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all rooms.
    pub fn len(&self) -> usize {
        self.rooms.iter().map(|r| r.value().len()).sum()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PresenceStore for MemoryPresenceStore {
    async fn upsert(
        &self,
        user_id: UserId,
        room: &str,
        data: &str,
        last_seen: i64,
    ) -> AppResult<()> {
        let mut members = self.rooms.entry(room.to_string()).or_default();
        members
            .entry(user_id)
            .and_modify(|record| {
                record.data = data.to_string();
                record.last_seen = last_seen;
            })
            .or_insert_with(|| PresenceRecord::new(user_id, room, data, last_seen));
        Ok(())
    }

    async fn touch(&self, user_id: UserId, room: &str, last_seen: i64) -> AppResult<()> {
        let mut members = self.rooms.entry(room.to_string()).or_default();
        members
            .entry(user_id)
            .and_modify(|record| record.last_seen = last_seen)
            .or_insert_with(|| PresenceRecord::new(user_id, room, "{}", last_seen));
        Ok(())
    }

    async fn find(&self, user_id: UserId, room: &str) -> AppResult<Option<PresenceRecord>> {
        Ok(self
            .rooms
            .get(room)
            .and_then(|members| members.get(&user_id).cloned()))
    }

    async fn query_by_room(&self, room: &str) -> AppResult<Vec<PresenceRecord>> {
        Ok(self
            .rooms
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn query_stale_before(&self, before: i64) -> AppResult<Vec<PresenceRecord>> {
        Ok(self
            .rooms
            .iter()
            .flat_map(|r| {
                r.value()
                    .values()
                    .filter(|record| record.last_seen < before)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    async fn delete_stale_before(&self, before: i64) -> AppResult<Vec<PresenceRecord>> {
        let mut removed = Vec::new();
        for mut entry in self.rooms.iter_mut() {
            let members = entry.value_mut();
            let stale: Vec<UserId> = members
                .values()
                .filter(|record| record.last_seen < before)
                .map(|record| record.user_id)
                .collect();
            for user_id in stale {
                if let Some(record) = members.remove(&user_id) {
                    removed.push(record);
                }
            }
        }
        self.rooms.retain(|_, members| !members.is_empty());
        debug!(count = removed.len(), before, "Deleted stale presence rows");
        Ok(removed)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let store = MemoryPresenceStore::new();
        let user = UserId::new();
        store.upsert(user, "room-a", r#"{"a":1}"#, 100).await.unwrap();
        store.upsert(user, "room-a", r#"{"b":2}"#, 200).await.unwrap();

        let rows = store.query_by_room("room-a").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data, r#"{"b":2}"#);
        assert_eq!(rows[0].last_seen, 200);
    }

    #[tokio::test]
    async fn test_same_user_in_two_rooms() {
        let store = MemoryPresenceStore::new();
        let user = UserId::new();
        store.upsert(user, "room-a", "{}", 100).await.unwrap();
        store.upsert(user, "room-b", "{}", 100).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.query_by_room("room-b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_touch_preserves_data_or_creates_empty() {
        let store = MemoryPresenceStore::new();
        let user = UserId::new();
        store.touch(user, "room-a", 50).await.unwrap();
        let created = store.find(user, "room-a").await.unwrap().unwrap();
        assert_eq!(created.data, "{}");

        store.upsert(user, "room-a", r#"{"typing":true}"#, 60).await.unwrap();
        store.touch(user, "room-a", 70).await.unwrap();
        let touched = store.find(user, "room-a").await.unwrap().unwrap();
        assert_eq!(touched.data, r#"{"typing":true}"#);
        assert_eq!(touched.last_seen, 70);
    }

    #[tokio::test]
    async fn test_stale_queries_and_delete() {
        let store = MemoryPresenceStore::new();
        let old = UserId::new();
        let fresh = UserId::new();
        store.upsert(old, "room-a", "{}", 10).await.unwrap();
        store.upsert(fresh, "room-a", "{}", 1_000).await.unwrap();
        store.upsert(old, "room-b", "{}", 20).await.unwrap();

        assert_eq!(store.query_stale_before(100).await.unwrap().len(), 2);

        let removed = store.delete_stale_before(100).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.query_by_room("room-b").await.unwrap().is_empty());

        let again = store.delete_stale_before(100).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_room_is_empty() {
        let store = MemoryPresenceStore::new();
        assert!(store.query_by_room("nowhere").await.unwrap().is_empty());
        assert!(store.find(UserId::new(), "nowhere").await.unwrap().is_none());
    }
}
