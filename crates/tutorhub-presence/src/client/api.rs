//! Transport seam between a session and the presence service.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use tutorhub_core::result::AppResult;
use tutorhub_core::types::UserId;
use tutorhub_entity::presence::EnrichedPresence;

use crate::events::RoomEvent;
use crate::service::PresenceService;

/// Stream of change notifications for one room.
pub type RoomEventStream = BoxStream<'static, RoomEvent>;

/// Presence operations as seen by one authenticated client.
#[async_trait]
pub trait PresenceApi: Send + Sync + std::fmt::Debug + 'static {
    /// Replace this client's blob in `room`.
    async fn update_presence(&self, room: &str, data: &str) -> AppResult<()>;

    /// Refresh this client's liveness in `room`.
    async fn heartbeat(&self, room: &str) -> AppResult<()>;

    /// Force this client offline in `room`.
    async fn set_offline(&self, room: &str) -> AppResult<()>;

    /// Everyone else in `room`.
    async fn query_presence_in_room(&self, room: &str) -> AppResult<Vec<EnrichedPresence>>;

    /// Change notifications for `room`.
    async fn subscribe(&self, room: &str) -> AppResult<RoomEventStream>;
}

/// Calls a [`PresenceService`] in the same process on behalf of one user.
#[derive(Debug, Clone)]
pub struct LocalPresenceApi {
    service: Arc<PresenceService>,
    caller: UserId,
}

impl LocalPresenceApi {
    /// Bind the service to an already authenticated caller.
    pub fn new(service: Arc<PresenceService>, caller: UserId) -> Self {
        Self { service, caller }
    }

    /// The caller every request is made as.
    pub fn caller(&self) -> UserId {
        self.caller
    }
}

#[async_trait]
impl PresenceApi for LocalPresenceApi {
    async fn update_presence(&self, room: &str, data: &str) -> AppResult<()> {
        self.service.update_presence(self.caller, room, data).await
    }

    async fn heartbeat(&self, room: &str) -> AppResult<()> {
        self.service.heartbeat(self.caller, room).await
    }

    async fn set_offline(&self, room: &str) -> AppResult<()> {
        self.service.set_offline(self.caller, room).await.map(|_| ())
    }

    async fn query_presence_in_room(&self, room: &str) -> AppResult<Vec<EnrichedPresence>> {
        self.service.query_presence_in_room(self.caller, room).await
    }

    async fn subscribe(&self, room: &str) -> AppResult<RoomEventStream> {
        Ok(self
            .service
            .subscribe(self.caller, room)
            .await?
            .into_stream())
    }
}
