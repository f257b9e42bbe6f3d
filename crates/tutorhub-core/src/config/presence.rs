//! Presence engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Where presence records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL `presence` table.
    Postgres,
    /// Process-local map; records vanish on restart.
    Memory,
}

/// Timing constants shared by the presence service and its clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Store backend.
    #[serde(default = "default_store")]
    pub store: StoreBackend,
    /// A record is online while `now - last_seen` is below this.
    #[serde(default = "default_online_threshold")]
    pub online_threshold_ms: u64,
    /// Client heartbeat period while visible.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// Minimum spacing between client presence writes.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    /// Inactivity after which the typing flag clears itself.
    #[serde(default = "default_typing_timeout")]
    pub typing_timeout_ms: u64,
    /// How far `set_offline` backdates `last_seen`.
    #[serde(default = "default_offline_backdate")]
    pub offline_backdate_ms: u64,
    /// Records older than this are removed by the cleanup sweep.
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold_hours: u64,
    /// Client view re-query period, so natural staleness shows up without writes.
    #[serde(default = "default_view_refresh")]
    pub view_refresh_ms: u64,
    /// Per-room change-event buffer.
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            online_threshold_ms: default_online_threshold(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            debounce_ms: default_debounce(),
            typing_timeout_ms: default_typing_timeout(),
            offline_backdate_ms: default_offline_backdate(),
            cleanup_threshold_hours: default_cleanup_threshold(),
            view_refresh_ms: default_view_refresh(),
            event_buffer_size: default_event_buffer(),
        }
    }
}

impl PresenceConfig {
    /// Reject timings that would make liveness flap.
    ///
    /// The online threshold must cover at least two and a half heartbeat
    /// periods so a single lost heartbeat never reads as offline, and the
    /// offline backdate must push `last_seen` past the threshold.
    pub fn validate(&self) -> Result<(), AppError> {
        let periods = [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("debounce_ms", self.debounce_ms),
            ("typing_timeout_ms", self.typing_timeout_ms),
            ("view_refresh_ms", self.view_refresh_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, ms)| *ms == 0) {
            return Err(AppError::configuration(format!(
                "presence.{name} must be positive"
            )));
        }
        if self.online_threshold_ms.saturating_mul(2) < self.heartbeat_interval_ms.saturating_mul(5)
        {
            return Err(AppError::configuration(format!(
                "presence.online_threshold_ms ({}) must be at least 2.5x heartbeat_interval_ms ({})",
                self.online_threshold_ms, self.heartbeat_interval_ms
            )));
        }
        if self.offline_backdate_ms < self.online_threshold_ms {
            return Err(AppError::configuration(format!(
                "presence.offline_backdate_ms ({}) must not be below online_threshold_ms ({})",
                self.offline_backdate_ms, self.online_threshold_ms
            )));
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::configuration(
                "presence.event_buffer_size must be positive",
            ));
        }
        Ok(())
    }

    /// Online threshold in milliseconds as a signed value for timestamp math.
    pub fn online_threshold_millis(&self) -> i64 {
        signed_millis(self.online_threshold_ms)
    }

    /// Offline backdate in milliseconds as a signed value.
    pub fn offline_backdate_millis(&self) -> i64 {
        signed_millis(self.offline_backdate_ms)
    }

    /// Cleanup threshold in milliseconds.
    pub fn cleanup_threshold_millis(&self) -> i64 {
        signed_millis(self.cleanup_threshold_hours.saturating_mul(60 * 60 * 1000))
    }

    /// Heartbeat period.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Write-coalescing window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Typing inactivity timeout.
    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }

    /// View refresh period.
    pub fn view_refresh(&self) -> Duration {
        Duration::from_millis(self.view_refresh_ms)
    }
}

fn signed_millis(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

fn default_store() -> StoreBackend {
    StoreBackend::Postgres
}

fn default_online_threshold() -> u64 {
    5_000
}

fn default_heartbeat_interval() -> u64 {
    2_000
}

fn default_debounce() -> u64 {
    50
}

fn default_typing_timeout() -> u64 {
    1_000
}

fn default_offline_backdate() -> u64 {
    10_000
}

fn default_cleanup_threshold() -> u64 {
    24
}

fn default_view_refresh() -> u64 {
    1_000
}

fn default_event_buffer() -> usize {
    64
}
