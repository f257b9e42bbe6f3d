//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tutorhub_auth::JwtEncoder;
use tutorhub_core::config::{AppConfig, StoreBackend};
use tutorhub_core::types::UserId;
use tutorhub_core::ManualClock;
use tutorhub_database::{MemoryPresenceStore, MemoryUserDirectory};
use tutorhub_entity::user::User;
use tutorhub_presence::PresenceService;

/// Epoch start for the manual clock.
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Test application context backed by the in-memory store
pub struct TestApp {
    /// The Axum application for making test requests
    pub router: Router,
    /// Controls what the service considers "now"
    pub clock: Arc<ManualClock>,
    /// Known users
    pub users: Arc<MemoryUserDirectory>,
    /// Presence records
    pub store: Arc<MemoryPresenceStore>,
    /// Shared service, for driving cleanup
    pub presence: Arc<PresenceService>,
    encoder: JwtEncoder,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.presence.store = StoreBackend::Memory;

        let store = Arc::new(MemoryPresenceStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let presence = Arc::new(PresenceService::new(
            store.clone(),
            users.clone(),
            clock.clone(),
            config.presence.clone(),
        ));

        let state = tutorhub_api::AppState::new(Arc::new(config.clone()), presence.clone());
        let router = tutorhub_api::build_app(state, &config.server.cors);
        let encoder = JwtEncoder::new(&config.auth);

        Self {
            router,
            clock,
            users,
            store,
            presence,
            encoder,
        }
    }

    /// Register a user and return an access token for them
    pub fn create_test_user(&self, first_name: &str, last_name: Option<&str>) -> (UserId, String) {
        let id = UserId::new();
        self.users
            .insert(User::new(id, first_name, last_name.map(str::to_string)));
        (id, self.token_for(id))
    }

    /// Access token for any id, known or not
    pub fn token_for(&self, id: UserId) -> String {
        self.encoder
            .generate_access_token(id)
            .expect("Failed to sign token")
            .0
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Send a prepared request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Publish presence for `token`'s user in `room`
    pub async fn update(&self, token: &str, room: &str, data: Value) -> TestResponse {
        self.request(
            "POST",
            "/api/presence/update",
            Some(serde_json::json!({ "room": room, "data": data.to_string() })),
            Some(token),
        )
        .await
    }

    /// Query `room` as `token`'s user, returning the `data` array
    pub async fn room(&self, token: &str, room: &str) -> Vec<Value> {
        let response = self
            .request("GET", &format!("/api/presence/rooms/{room}"), None, Some(token))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["data"]
            .as_array()
            .cloned()
            .expect("data array")
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
