//! Room events socket and the HTTP client against a live listener.

use std::time::Duration;

use futures::StreamExt;
use http::StatusCode;
use serde_json::json;

use tutorhub_presence::{PresenceApi, RoomEvent};
use tutorhub_presence::client::HttpPresenceApi;

use crate::helpers::TestApp;

const ROOM: &str = "conversation-42";

/// Serve `app` on an ephemeral port and return its base URL.
async fn spawn_server(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_ws_requires_token() {
    let app = TestApp::new();
    let response = app
        .request("GET", &format!("/ws/presence/{ROOM}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_http_client_round_trip_and_events() {
    let app = TestApp::new();
    let base_url = spawn_server(&app).await;
    let (alice, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);

    let alice_api = HttpPresenceApi::new(&base_url, alice_token).expect("client");
    let bob_api = HttpPresenceApi::new(&base_url, bob_token).expect("client");

    let mut events = bob_api.subscribe(ROOM).await.expect("subscribe");

    alice_api
        .update_presence(ROOM, &json!({"status": "online", "typing": true}).to_string())
        .await
        .expect("update");

    let event = tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .expect("event in time")
        .expect("stream open");
    assert_eq!(
        event,
        RoomEvent::Updated {
            room: ROOM.to_string(),
            user_id: alice,
            at: crate::helpers::START_MILLIS,
        }
    );

    let others = bob_api.query_presence_in_room(ROOM).await.expect("query");
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].user_id, alice);
    assert!(others[0].is_typing());

    alice_api.set_offline(ROOM).await.expect("offline");
    let others = bob_api.query_presence_in_room(ROOM).await.expect("query");
    assert!(!others[0].is_online);
}

#[tokio::test]
async fn test_http_client_maps_unknown_user_to_authentication_error() {
    let app = TestApp::new();
    let base_url = spawn_server(&app).await;
    let ghost = app.token_for(tutorhub_core::types::UserId::new());

    let api = HttpPresenceApi::new(&base_url, ghost).expect("client");
    let err = api.heartbeat(ROOM).await.unwrap_err();

    assert!(err.is_authentication());
}
