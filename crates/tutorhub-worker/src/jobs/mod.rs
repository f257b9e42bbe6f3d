//! Built-in job handler implementations.

pub mod presence;

pub use presence::PresenceCleanupJob;
