//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tutorhub_auth::jwt::JwtDecoder;
use tutorhub_core::config::AppConfig;
use tutorhub_presence::PresenceService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Presence service
    pub presence: Arc<PresenceService>,
}

impl AppState {
    /// Assemble state from its parts.
    pub fn new(config: Arc<AppConfig>, presence: Arc<PresenceService>) -> Self {
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        Self {
            config,
            jwt_decoder,
            presence,
        }
    }
}
