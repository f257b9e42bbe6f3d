//! Server-side presence operations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use tutorhub_core::Clock;
use tutorhub_core::config::PresenceConfig;
use tutorhub_core::error::AppError;
use tutorhub_core::result::AppResult;
use tutorhub_core::types::UserId;
use tutorhub_database::{PresenceStore, UserDirectory};
use tutorhub_entity::presence::{EnrichedPresence, MAX_ROOM_LEN, OnlineStatus, PresenceData};
use tutorhub_entity::user::User;

use crate::events::{RoomEvent, RoomEventHub, RoomSubscription};

/// Records liveness per (user, room) and answers "who is here".
///
/// Every operation except [`cleanup_presence`](Self::cleanup_presence)
/// takes the authenticated caller and fails with an authentication error
/// when the caller is not a known user.
#[derive(Debug, Clone)]
pub struct PresenceService {
    store: Arc<dyn PresenceStore>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    events: Arc<RoomEventHub>,
    config: PresenceConfig,
}

impl PresenceService {
    /// Creates a new presence service.
    pub fn new(
        store: Arc<dyn PresenceStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        config: PresenceConfig,
    ) -> Self {
        let events = Arc::new(RoomEventHub::new(config.event_buffer_size));
        Self {
            store,
            users,
            clock,
            events,
            config,
        }
    }

    /// Timing configuration.
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Replace the caller's blob in `room` and stamp `last_seen = now`.
    pub async fn update_presence(&self, caller: UserId, room: &str, data: &str) -> AppResult<()> {
        validate_room(room)?;
        self.require_user(caller).await?;

        let now = self.clock.now_millis();
        self.store.upsert(caller, room, data, now).await?;
        debug!(user_id = %caller, room, "Presence updated");

        self.events
            .publish(RoomEvent::Updated {
                room: room.to_string(),
                user_id: caller,
                at: now,
            })
            .await;
        Ok(())
    }

    /// Refresh the caller's `last_seen`, creating an empty record if absent.
    pub async fn heartbeat(&self, caller: UserId, room: &str) -> AppResult<()> {
        validate_room(room)?;
        self.require_user(caller).await?;

        let now = self.clock.now_millis();
        self.store.touch(caller, room, now).await?;

        self.events
            .publish(RoomEvent::Heartbeat {
                room: room.to_string(),
                user_id: caller,
                at: now,
            })
            .await;
        Ok(())
    }

    /// Every other user's presence in `room`, enriched with display names.
    ///
    /// Rows whose user cannot be resolved are left out. Online users come
    /// first, then by `last_seen` descending.
    pub async fn query_presence_in_room(
        &self,
        caller: UserId,
        room: &str,
    ) -> AppResult<Vec<EnrichedPresence>> {
        validate_room(room)?;
        self.require_user(caller).await?;

        let records: Vec<_> = self
            .store
            .query_by_room(room)
            .await?
            .into_iter()
            .filter(|record| record.user_id != caller)
            .collect();
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = records.iter().map(|record| record.user_id).collect();
        let users: HashMap<UserId, User> = self
            .users
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let now = self.clock.now_millis();
        let threshold = self.config.online_threshold_millis();

        let mut enriched: Vec<EnrichedPresence> = records
            .into_iter()
            .filter_map(|record| {
                let user = users.get(&record.user_id)?;
                Some(EnrichedPresence {
                    user_id: record.user_id,
                    user_name: user.display_name(),
                    is_online: record.is_online_at(now, threshold),
                    data: record.data,
                    last_seen: record.last_seen,
                })
            })
            .collect();

        enriched.sort_by(|a, b| {
            b.is_online
                .cmp(&a.is_online)
                .then(b.last_seen.cmp(&a.last_seen))
        });
        Ok(enriched)
    }

    /// Force the caller offline in `room` without waiting for the threshold.
    ///
    /// Rewrites the blob with `status = offline` and backdates `last_seen`
    /// past the online threshold. Returns `false` when the caller has no
    /// record in the room, in which case nothing is written.
    pub async fn set_offline(&self, caller: UserId, room: &str) -> AppResult<bool> {
        validate_room(room)?;
        self.require_user(caller).await?;

        let Some(record) = self.store.find(caller, room).await? else {
            debug!(user_id = %caller, room, "No presence record to mark offline");
            return Ok(false);
        };

        let now = self.clock.now_millis();
        let data = PresenceData::parse_lenient(&record.data)
            .with_status(OnlineStatus::Offline)
            .with_last_seen(now);
        let backdated = now - self.config.offline_backdate_millis();

        self.store
            .upsert(caller, room, &data.to_json(), backdated)
            .await?;
        debug!(user_id = %caller, room, "Presence set offline");

        self.events
            .publish(RoomEvent::WentOffline {
                room: room.to_string(),
                user_id: caller,
            })
            .await;
        Ok(true)
    }

    /// Delete every record older than the cleanup threshold.
    ///
    /// Idempotent; returns how many records were removed.
    pub async fn cleanup_presence(&self) -> AppResult<u64> {
        let cutoff = self.clock.now_millis() - self.config.cleanup_threshold_millis();
        let removed = self.store.delete_stale_before(cutoff).await?;

        let rooms: BTreeSet<&str> = removed.iter().map(|r| r.room.as_str()).collect();
        info!(
            removed = removed.len(),
            rooms = rooms.len(),
            cutoff,
            "Presence cleanup finished"
        );

        for record in &removed {
            self.events
                .publish(RoomEvent::Removed {
                    room: record.room.clone(),
                    user_id: record.user_id,
                })
                .await;
        }
        Ok(removed.len() as u64)
    }

    /// Subscribe to change notifications for `room`.
    pub async fn subscribe(&self, caller: UserId, room: &str) -> AppResult<RoomSubscription> {
        validate_room(room)?;
        self.require_user(caller).await?;
        Ok(self.events.subscribe(room).await)
    }

    /// Whether the store is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.store.health_check().await
    }

    async fn require_user(&self, caller: UserId) -> AppResult<User> {
        self.users
            .find_user(caller)
            .await?
            .ok_or_else(|| AppError::authentication("User not found"))
    }
}

fn validate_room(room: &str) -> AppResult<()> {
    if room.is_empty() {
        return Err(AppError::validation("Room must not be empty"));
    }
    if room.len() > MAX_ROOM_LEN {
        return Err(AppError::validation(format!(
            "Room must be at most {MAX_ROOM_LEN} bytes"
        )));
    }
    Ok(())
}
