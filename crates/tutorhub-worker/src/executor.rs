//! Job contract and execution helper.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use tutorhub_core::error::AppError;

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Get the job type this handler processes
    fn job_type(&self) -> &str;

    /// Run the job once, returning an optional summary for the log
    async fn execute(&self) -> Result<Option<Value>, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, do not retry
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the next scheduled run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Runs `handler` once and logs the outcome. Failures never propagate to
/// the scheduler; the next tick simply tries again.
pub async fn run_job(handler: Arc<dyn JobHandler>) {
    let job_type = handler.job_type().to_string();
    let start = Instant::now();

    match handler.execute().await {
        Ok(summary) => {
            tracing::info!(
                job_type = %job_type,
                duration_ms = start.elapsed().as_millis() as u64,
                summary = ?summary,
                "Job completed"
            );
        }
        Err(JobExecutionError::Transient(msg)) => {
            tracing::warn!(job_type = %job_type, "Job failed, will retry on next run: {}", msg);
        }
        Err(e) => {
            tracing::error!(job_type = %job_type, error = %e, "Job failed");
        }
    }
}
