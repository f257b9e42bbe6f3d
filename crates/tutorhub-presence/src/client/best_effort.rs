//! Non-propagating error boundary for presence writes.
//!
//! Presence is a liveness hint. A failed update, heartbeat or offline call
//! must never reach the caller or block it, so every fire-and-forget call
//! in a session goes through [`best_effort`]: the error is logged at
//! `warn` and discarded, and the caller continues with `None`.

use std::future::Future;

use tracing::warn;

use tutorhub_core::result::AppResult;

/// Await `call`, logging and discarding any error.
pub async fn best_effort<T>(
    operation: &'static str,
    room: &str,
    call: impl Future<Output = AppResult<T>>,
) -> Option<T> {
    match call.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, room, error = %e, "Presence call failed");
            None
        }
    }
}
