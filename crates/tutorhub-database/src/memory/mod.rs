//! In-process backends.

pub mod presence;
pub mod user;

pub use presence::MemoryPresenceStore;
pub use user::MemoryUserDirectory;
