//! Scheduled maintenance tasks for TutorHub.
//!
//! This crate provides:
//! - A cron scheduler that runs registered jobs on their schedules
//! - The [`JobHandler`] contract jobs implement
//! - The presence cleanup job

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobHandler};
pub use scheduler::CronScheduler;
