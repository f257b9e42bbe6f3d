//! # tutorhub-database
//!
//! Persistence for presence: the [`PresenceStore`] and [`UserDirectory`]
//! contracts, their PostgreSQL implementations, and in-memory twins used
//! by the `memory` backend and by tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryPresenceStore, MemoryUserDirectory};
pub use repositories::{PgPresenceStore, UserRepository};
pub use store::{PresenceStore, UserDirectory};
