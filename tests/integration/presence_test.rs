//! Presence endpoints end to end over the router.

use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::json;

use crate::helpers::TestApp;

const ROOM: &str = "global-messages";

#[tokio::test]
async fn test_update_then_query_from_other_user() {
    let app = TestApp::new();
    let (alice, alice_token) = app.create_test_user("Alice", Some("Liddell"));
    let (_, bob_token) = app.create_test_user("Bob", None);

    let response = app
        .update(&alice_token, ROOM, json!({"status": "online", "inMessagesPage": true}))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let others = app.room(&bob_token, ROOM).await;
    assert_eq!(others.len(), 1);
    assert_eq!(others[0]["userId"], alice.to_string());
    assert_eq!(others[0]["userName"], "Alice Liddell");
    assert_eq!(others[0]["isOnline"], true);
    assert_eq!(others[0]["lastSeen"], crate::helpers::START_MILLIS);

    // The caller never sees their own record.
    assert!(app.room(&alice_token, ROOM).await.is_empty());
}

#[tokio::test]
async fn test_record_goes_stale_without_heartbeat() {
    let app = TestApp::new();
    let (_, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);

    app.update(&alice_token, ROOM, json!({"status": "online"})).await;

    app.clock.advance(4_999);
    assert_eq!(app.room(&bob_token, ROOM).await[0]["isOnline"], true);

    app.clock.advance(1);
    assert_eq!(app.room(&bob_token, ROOM).await[0]["isOnline"], false);

    let response = app
        .request(
            "POST",
            "/api/presence/heartbeat",
            Some(json!({"room": ROOM})),
            Some(&alice_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.room(&bob_token, ROOM).await[0]["isOnline"], true);
}

#[tokio::test]
async fn test_set_offline_marks_record_offline() {
    let app = TestApp::new();
    let (_, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);

    app.update(&alice_token, ROOM, json!({"status": "online", "isTyping": false}))
        .await;

    let response = app
        .request(
            "POST",
            "/api/presence/offline",
            Some(json!({"room": ROOM})),
            Some(&alice_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let others = app.room(&bob_token, ROOM).await;
    assert_eq!(others[0]["isOnline"], false);
    let data: serde_json::Value =
        serde_json::from_str(others[0]["data"].as_str().expect("data string")).expect("json");
    assert_eq!(data["status"], "offline");
}

#[tokio::test]
async fn test_offline_beacon_with_query_token_and_text_body() {
    let app = TestApp::new();
    let (_, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);
    app.update(&alice_token, ROOM, json!({"status": "online"})).await;

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/presence/offline?token={alice_token}"))
        .header("Content-Type", "text/plain;charset=UTF-8")
        .body(Body::from(json!({"room": ROOM}).to_string()))
        .expect("request");
    let response = app.send(req).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.room(&bob_token, ROOM).await[0]["isOnline"], false);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/presence/update",
            Some(json!({"room": ROOM, "data": "{}"})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_for_unknown_user_is_unauthorized() {
    let app = TestApp::new();
    let ghost = app.token_for(tutorhub_core::types::UserId::new());

    let response = app.update(&ghost, ROOM, json!({"status": "online"})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .request("GET", "/api/presence/rooms/global-messages", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let app = TestApp::new();
    let (_, token) = app.create_test_user("Alice", None);

    let empty_room = app.update(&token, "", json!({})).await;
    assert_eq!(empty_room.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty_room.body["error"], "VALIDATION_ERROR");

    let long_room = app.update(&token, &"r".repeat(256), json!({})).await;
    assert_eq!(long_room.status, StatusCode::BAD_REQUEST);

    let not_json = Request::builder()
        .method("POST")
        .uri("/api/presence/update")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from("{not json"))
        .expect("request");
    assert_eq!(app.send(not_json).await.status, StatusCode::BAD_REQUEST);

    let missing_field = app
        .request(
            "POST",
            "/api/presence/heartbeat",
            Some(json!({})),
            Some(&token),
        )
        .await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);

    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_malformed_blob_is_stored_as_is() {
    let app = TestApp::new();
    let (_, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);

    let response = app
        .request(
            "POST",
            "/api/presence/update",
            Some(json!({"room": ROOM, "data": "{not json"})),
            Some(&alice_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.room(&bob_token, ROOM).await[0]["data"], "{not json");
}

#[tokio::test]
async fn test_conversation_rooms_are_isolated() {
    let app = TestApp::new();
    let (_, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);

    app.update(&alice_token, "conversation-1", json!({"inConversation": true}))
        .await;

    assert_eq!(app.room(&bob_token, "conversation-1").await.len(), 1);
    assert!(app.room(&bob_token, "conversation-2").await.is_empty());
    assert!(app.room(&bob_token, ROOM).await.is_empty());
}

#[tokio::test]
async fn test_cleanup_removes_day_old_records() {
    let app = TestApp::new();
    let (_, alice_token) = app.create_test_user("Alice", None);
    let (_, bob_token) = app.create_test_user("Bob", None);
    app.update(&alice_token, ROOM, json!({"status": "online"})).await;

    app.clock.advance(24 * 60 * 60 * 1000 + 1);
    let removed = app.presence.cleanup_presence().await.expect("cleanup");

    assert_eq!(removed, 1);
    assert!(app.room(&bob_token, ROOM).await.is_empty());
}
