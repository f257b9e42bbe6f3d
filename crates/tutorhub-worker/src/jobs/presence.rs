//! Presence cleanup job: deletes records unseen for longer than the
//! cleanup threshold.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use tutorhub_core::error::ErrorKind;
use tutorhub_presence::PresenceService;

use crate::executor::{JobExecutionError, JobHandler};

/// Handles presence cleanup
#[derive(Debug)]
pub struct PresenceCleanupJob {
    presence: Arc<PresenceService>,
}

impl PresenceCleanupJob {
    /// Create a new presence cleanup job
    pub fn new(presence: Arc<PresenceService>) -> Self {
        Self { presence }
    }
}

#[async_trait]
impl JobHandler for PresenceCleanupJob {
    fn job_type(&self) -> &str {
        "presence_cleanup"
    }

    async fn execute(&self) -> Result<Option<Value>, JobExecutionError> {
        tracing::debug!("Running presence cleanup");

        let removed = self.presence.cleanup_presence().await.map_err(|e| match e.kind {
            ErrorKind::Database | ErrorKind::ServiceUnavailable => {
                JobExecutionError::Transient(e.to_string())
            }
            _ => JobExecutionError::Internal(e),
        })?;

        if removed > 0 {
            tracing::info!("Presence cleanup: {} stale records removed", removed);
        }

        Ok(Some(serde_json::json!({
            "task": "presence_cleanup",
            "removed": removed,
            "threshold_hours": self.presence.config().cleanup_threshold_hours,
        })))
    }
}

#[cfg(test)]
mod tests {
    use tutorhub_core::ManualClock;
    use tutorhub_core::config::PresenceConfig;
    use tutorhub_core::types::UserId;
    use tutorhub_database::{MemoryPresenceStore, MemoryUserDirectory};
    use tutorhub_entity::user::User;

    use super::*;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    #[tokio::test]
    async fn test_cleanup_removes_only_stale_records() {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(MemoryPresenceStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let presence = Arc::new(PresenceService::new(
            store.clone(),
            users.clone(),
            clock.clone(),
            PresenceConfig::default(),
        ));

        let old = UserId::new();
        let fresh = UserId::new();
        users.insert(User::new(old, "Ada", None));
        users.insert(User::new(fresh, "Grace", None));

        presence
            .update_presence(old, "global-messages", r#"{"status":"online"}"#)
            .await
            .unwrap();
        clock.advance(23 * HOUR_MS);
        presence
            .update_presence(fresh, "global-messages", r#"{"status":"online"}"#)
            .await
            .unwrap();
        clock.advance(2 * HOUR_MS);

        let job = PresenceCleanupJob::new(presence);
        let summary = job.execute().await.unwrap().unwrap();
        assert_eq!(summary["removed"], 1);
        assert_eq!(store.len(), 1);

        let again = job.execute().await.unwrap().unwrap();
        assert_eq!(again["removed"], 0);
    }
}
