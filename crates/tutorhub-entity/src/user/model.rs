//! User entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tutorhub_core::types::UserId;

/// The slice of a marketplace user that presence needs: identity and name.
///
/// Users are owned by the auth/marketplace side; presence only reads them
/// to label records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name, if provided.
    pub last_name: Option<String>,
}

impl User {
    /// Create a user value.
    pub fn new(id: UserId, first_name: impl Into<String>, last_name: Option<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name,
        }
    }

    /// Human-readable name shown next to presence indicators.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}
