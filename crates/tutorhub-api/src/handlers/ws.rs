//! Room events WebSocket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use tutorhub_core::types::UserId;
use tutorhub_presence::RoomSubscription;

use crate::extractors::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws/presence/{room}?token={jwt}
///
/// Authenticates and subscribes before upgrading, so a bad token or room
/// is rejected with a normal HTTP error.
pub async fn room_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(room): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let subscription = state.presence.subscribe(auth.user_id, &room).await?;
    Ok(ws.on_upgrade(move |socket| forward_events(socket, auth.user_id, subscription)))
}

/// Pushes room events to the socket until either side goes away.
async fn forward_events(socket: WebSocket, user_id: UserId, mut subscription: RoomSubscription) {
    let room = subscription.room().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!(user_id = %user_id, room = %room, "Room events connection established");

    let outbound_task = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize room event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames are ignored; the loop only watches for close.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "Room events socket error");
                break;
            }
        }
    }

    outbound_task.abort();
    info!(user_id = %user_id, room = %room, "Room events connection closed");
}
