//! Persistence contracts consumed by the presence service.

use async_trait::async_trait;

use tutorhub_core::result::AppResult;
use tutorhub_core::types::UserId;
use tutorhub_entity::presence::PresenceRecord;
use tutorhub_entity::user::User;

/// Durable per-room, per-user presence rows.
///
/// Implementations must make `upsert` and `touch` atomic per
/// (room, user) key: concurrent calls for the same key may race, but the
/// row must always hold one complete write.
#[async_trait]
pub trait PresenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert the row, or overwrite `data` and `last_seen` if it exists.
    async fn upsert(
        &self,
        user_id: UserId,
        room: &str,
        data: &str,
        last_seen: i64,
    ) -> AppResult<()>;

    /// Overwrite only `last_seen`; insert with an empty blob if absent.
    async fn touch(&self, user_id: UserId, room: &str, last_seen: i64) -> AppResult<()>;

    /// Point lookup by (room, user).
    async fn find(&self, user_id: UserId, room: &str) -> AppResult<Option<PresenceRecord>>;

    /// All rows of a room, in no particular order.
    async fn query_by_room(&self, room: &str) -> AppResult<Vec<PresenceRecord>>;

    /// All rows with `last_seen < before`.
    async fn query_stale_before(&self, before: i64) -> AppResult<Vec<PresenceRecord>>;

    /// Delete all rows with `last_seen < before` and return them.
    async fn delete_stale_before(&self, before: i64) -> AppResult<Vec<PresenceRecord>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Read access to the externally owned user table.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Look up one user.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Look up many users at once; unknown ids are simply absent.
    async fn find_users(&self, ids: &[UserId]) -> AppResult<Vec<User>>;
}
