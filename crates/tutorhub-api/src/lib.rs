//! # tutorhub-api
//!
//! HTTP API layer for TutorHub built on Axum.
//!
//! Exposes the presence operations as REST endpoints, streams room change
//! events over a WebSocket, and maps `AppError` onto HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
