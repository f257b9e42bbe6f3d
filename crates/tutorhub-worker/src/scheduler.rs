//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use tutorhub_core::config::WorkerConfig;
use tutorhub_core::error::AppError;
use tutorhub_presence::PresenceService;

use crate::executor::{JobHandler, run_job};
use crate::jobs::PresenceCleanupJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Register all default scheduled tasks
    pub async fn register_default_tasks(
        &self,
        config: &WorkerConfig,
        presence: Arc<PresenceService>,
    ) -> Result<(), AppError> {
        let cleanup = Arc::new(PresenceCleanupJob::new(presence));
        self.register(&config.presence_cleanup_cron, cleanup).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `handler` on the given six-field cron schedule
    pub async fn register(
        &self,
        schedule: &str,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), AppError> {
        let job_type = handler.job_type().to_string();

        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                run_job(handler).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{}' for {}: {}",
                schedule, job_type, e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {} schedule: {}", job_type, e))
        })?;

        tracing::info!("Registered: {} ({})", job_type, schedule);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
