//! In-memory user directory.

use async_trait::async_trait;
use dashmap::DashMap;

use tutorhub_core::result::AppResult;
use tutorhub_core::types::UserId;
use tutorhub_entity::user::User;

use crate::store::UserDirectory;

/// User directory held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, User>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Remove a user.
    pub fn remove(&self, id: UserId) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_users(&self, ids: &[UserId]) -> AppResult<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|r| r.value().clone()))
            .collect())
    }
}
