//! Route definitions for the TutorHub HTTP API.
//!
//! REST routes are mounted under `/api`; the room events socket lives
//! under `/ws`.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(presence_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws/presence/{room}", get(handlers::ws::room_events));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Presence writes and room queries
fn presence_routes() -> Router<AppState> {
    Router::new()
        .route("/presence/update", post(handlers::presence::update_presence))
        .route("/presence/heartbeat", post(handlers::presence::heartbeat))
        .route("/presence/offline", post(handlers::presence::set_offline))
        .route(
            "/presence/rooms/{room}",
            get(handlers::presence::room_presence),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
