//! Presence handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use tutorhub_entity::presence::EnrichedPresence;

use crate::dto::request::{RoomRequest, UpdatePresenceRequest};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/presence/update
pub async fn update_presence(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdatePresenceRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .presence
        .update_presence(auth.user_id, &req.room, &req.data)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/presence/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<RoomRequest>,
) -> Result<StatusCode, ApiError> {
    state.presence.heartbeat(auth.user_id, &req.room).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/presence/offline
pub async fn set_offline(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<RoomRequest>,
) -> Result<StatusCode, ApiError> {
    state.presence.set_offline(auth.user_id, &req.room).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/presence/rooms/{room}
pub async fn room_presence(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(room): Path<String>,
) -> Result<Json<ApiResponse<Vec<EnrichedPresence>>>, ApiError> {
    let others = state
        .presence
        .query_presence_in_room(auth.user_id, &room)
        .await?;
    Ok(Json(ApiResponse::ok(others)))
}
