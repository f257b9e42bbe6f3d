//! Shared fixtures for unit tests.

use std::sync::Arc;

use tokio::time::Instant;

use tutorhub_core::config::PresenceConfig;
use tutorhub_core::types::UserId;
use tutorhub_core::{Clock, ManualClock};
use tutorhub_database::{MemoryPresenceStore, MemoryUserDirectory};
use tutorhub_entity::user::User;

use crate::client::LocalPresenceApi;
use crate::service::PresenceService;

/// Epoch-millisecond clock that follows tokio's (pausable) time, so
/// session timers and server-side liveness advance together.
#[derive(Debug)]
pub(crate) struct TokioClock {
    origin: Instant,
    base_millis: i64,
}

impl TokioClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            base_millis: 1_700_000_000_000,
        }
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        self.base_millis + self.origin.elapsed().as_millis() as i64
    }
}

pub(crate) struct Fixture<C: Clock = ManualClock> {
    pub(crate) service: Arc<PresenceService>,
    pub(crate) store: Arc<MemoryPresenceStore>,
    pub(crate) users: Arc<MemoryUserDirectory>,
    pub(crate) clock: Arc<C>,
}

impl Fixture<ManualClock> {
    pub(crate) fn new() -> Self {
        Self::with_clock(Arc::new(ManualClock::new(1_700_000_000_000)))
    }
}

impl Fixture<TokioClock> {
    /// Fixture for `start_paused` tests.
    pub(crate) fn paused() -> Self {
        Self::with_clock(Arc::new(TokioClock::new()))
    }
}

impl<C: Clock> Fixture<C> {
    fn with_clock(clock: Arc<C>) -> Self {
        let store = Arc::new(MemoryPresenceStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let service = Arc::new(PresenceService::new(
            store.clone(),
            users.clone(),
            clock.clone(),
            PresenceConfig::default(),
        ));
        Self {
            service,
            store,
            users,
            clock,
        }
    }

    pub(crate) fn user(&self, first_name: &str, last_name: Option<&str>) -> UserId {
        let id = UserId::new();
        self.users
            .insert(User::new(id, first_name, last_name.map(str::to_string)));
        id
    }

    pub(crate) fn api(&self, user: UserId) -> Arc<LocalPresenceApi> {
        Arc::new(LocalPresenceApi::new(self.service.clone(), user))
    }
}
