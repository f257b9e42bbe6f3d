//! Request and response bodies.

pub mod request;
pub mod response;

pub use request::{RoomRequest, UpdatePresenceRequest};
pub use response::{ApiResponse, HealthResponse};
