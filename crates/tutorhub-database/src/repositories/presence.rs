//! Presence repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use tutorhub_core::error::{AppError, ErrorKind};
use tutorhub_core::result::AppResult;
use tutorhub_core::types::UserId;
use tutorhub_entity::presence::PresenceRecord;

use crate::store::PresenceStore;

/// PostgreSQL-backed presence store.
///
/// Upserts rely on the `presence_room_user_key` unique constraint, so each
/// write is a single atomic statement.
#[derive(Debug, Clone)]
pub struct PgPresenceStore {
    pool: PgPool,
}

impl PgPresenceStore {
    /// Create a new presence store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceStore for PgPresenceStore {
    async fn upsert(
        &self,
        user_id: UserId,
        room: &str,
        data: &str,
        last_seen: i64,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO presence (user_id, room, data, last_seen) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (room, user_id) DO UPDATE SET data = EXCLUDED.data, last_seen = EXCLUDED.last_seen",
        )
        .bind(user_id)
        .bind(room)
        .bind(data)
        .bind(last_seen)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert presence", e))?;
        Ok(())
    }

    async fn touch(&self, user_id: UserId, room: &str, last_seen: i64) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO presence (user_id, room, data, last_seen) VALUES ($1, $2, '{}', $3) \
             ON CONFLICT (room, user_id) DO UPDATE SET last_seen = EXCLUDED.last_seen",
        )
        .bind(user_id)
        .bind(room)
        .bind(last_seen)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch presence", e))?;
        Ok(())
    }

    async fn find(&self, user_id: UserId, room: &str) -> AppResult<Option<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>(
            "SELECT user_id, room, data, last_seen FROM presence WHERE room = $1 AND user_id = $2",
        )
        .bind(room)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find presence", e))
    }

    async fn query_by_room(&self, room: &str) -> AppResult<Vec<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>(
            "SELECT user_id, room, data, last_seen FROM presence WHERE room = $1",
        )
        .bind(room)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query presence by room", e)
        })
    }

    async fn query_stale_before(&self, before: i64) -> AppResult<Vec<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>(
            "SELECT user_id, room, data, last_seen FROM presence WHERE last_seen < $1",
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query stale presence", e)
        })
    }

    async fn delete_stale_before(&self, before: i64) -> AppResult<Vec<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>(
            "DELETE FROM presence WHERE last_seen < $1 RETURNING user_id, room, data, last_seen",
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete stale presence", e)
        })
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
