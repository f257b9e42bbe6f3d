//! # tutorhub-core
//!
//! Core crate for TutorHub. Contains configuration schemas, typed
//! identifiers, the wall-clock abstraction used for liveness math,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other TutorHub crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AppError;
pub use result::AppResult;
