//! PostgreSQL implementations of the persistence contracts.

pub mod presence;
pub mod user;

pub use presence::PgPresenceStore;
pub use user::UserRepository;
