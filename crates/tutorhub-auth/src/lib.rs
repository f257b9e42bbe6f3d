//! # tutorhub-auth
//!
//! Bearer-token handling for TutorHub. Login flows live with the external
//! auth provider; this crate only turns a signed access token into the
//! caller's [`UserId`](tutorhub_core::types::UserId).
//!
//! ## Modules
//!
//! - `jwt`: JWT claims, validation, and token issuing

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
