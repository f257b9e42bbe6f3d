//! Presence API over the REST surface and the room events WebSocket.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, future};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, warn};

use tutorhub_core::error::{AppError, ErrorKind};
use tutorhub_core::result::AppResult;
use tutorhub_entity::presence::EnrichedPresence;

use super::api::{PresenceApi, RoomEventStream};
use crate::events::RoomEvent;

/// Upper bound on one REST call, in line with the heartbeat cadence.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on establishing a TCP connection or WebSocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Body of the room-scoped POST endpoints.
#[derive(Debug, Serialize)]
struct RoomBody<'a> {
    room: &'a str,
}

/// Body of `POST /api/presence/update`.
#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    room: &'a str,
    data: &'a str,
}

/// Success envelope returned by the API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Talks to a remote TutorHub server with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpPresenceApi {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpPresenceApi {
    /// Create a client for the server at `base_url` (e.g. `http://host:8080`).
    pub fn new(base_url: &str, token: impl Into<String>) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid base URL", e))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e)
        })?;
        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// Resolve a path below the base URL, appending `room` as its own
    /// percent-encoded segment when given.
    fn endpoint(&self, path: &[&str], room: Option<&str>) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::configuration("Base URL cannot carry a path")
            })?;
            segments.pop_if_empty().extend(path.iter().copied());
            if let Some(room) = room {
                segments.push(room);
            }
        }
        Ok(url)
    }

    fn events_url(&self, room: &str) -> AppResult<Url> {
        let mut url = self.endpoint(&["ws", "presence"], Some(room))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| AppError::configuration("Cannot derive WebSocket URL"))?;
        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }

    async fn post<B: Serialize + Sync>(&self, path: &[&str], body: &B) -> AppResult<()> {
        let url = self.endpoint(path, None)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await.map(|_| ())
    }
}

#[async_trait]
impl PresenceApi for HttpPresenceApi {
    async fn update_presence(&self, room: &str, data: &str) -> AppResult<()> {
        self.post(&["api", "presence", "update"], &UpdateBody { room, data })
            .await
    }

    async fn heartbeat(&self, room: &str) -> AppResult<()> {
        self.post(&["api", "presence", "heartbeat"], &RoomBody { room })
            .await
    }

    async fn set_offline(&self, room: &str) -> AppResult<()> {
        self.post(&["api", "presence", "offline"], &RoomBody { room })
            .await
    }

    async fn query_presence_in_room(&self, room: &str) -> AppResult<Vec<EnrichedPresence>> {
        let url = self.endpoint(&["api", "presence", "rooms"], Some(room))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;
        let envelope: Envelope<Vec<EnrichedPresence>> = check_status(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(envelope.data)
    }

    async fn subscribe(&self, room: &str) -> AppResult<RoomEventStream> {
        let url = self.events_url(room)?;
        let (ws_stream, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                AppError::new(ErrorKind::ExternalService, "Room events connection timed out")
            })?
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    "Room events connection failed",
                    e,
                )
            })?;
        debug!(room, "Connected to room events");

        let events = ws_stream
            .take_while(|message| future::ready(matches!(message, Ok(m) if !m.is_close())))
            .filter_map(|message| future::ready(decode_event(message)));
        Ok(events.boxed())
    }
}

fn decode_event(message: Result<Message, tungstenite::Error>) -> Option<RoomEvent> {
    let message = message.ok()?;
    if !message.is_text() {
        return None;
    }
    match serde_json::from_str::<RoomEvent>(message.to_text().ok()?) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed room event");
            None
        }
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::with_source(ErrorKind::ExternalService, "Presence request failed", e)
}

async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());
    let kind = match status.as_u16() {
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        400 | 422 => ErrorKind::Validation,
        404 => ErrorKind::NotFound,
        503 => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::ExternalService,
    };
    Err(AppError::new(kind, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_room() {
        let api = HttpPresenceApi::new("http://localhost:8080/", "tok").unwrap();
        let url = api
            .endpoint(&["api", "presence", "rooms"], Some("conversation-1/../x"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/presence/rooms/conversation-1%2F..%2Fx"
        );
    }

    #[test]
    fn test_events_url_uses_ws_scheme_and_token() {
        let api = HttpPresenceApi::new("https://example.com", "abc").unwrap();
        let url = api.events_url("global-messages").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://example.com/ws/presence/global-messages?token=abc"
        );
    }

    /// Accepts connections but never answers them.
    async fn silent_server() -> (tokio::net::TcpListener, String) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    #[tokio::test]
    async fn test_request_to_silent_server_times_out() {
        let (listener, base) = silent_server().await;
        let _held = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });
        let api = HttpPresenceApi::new(&base, "t").unwrap();

        let started = std::time::Instant::now();
        let err = api.heartbeat("global-messages").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(started.elapsed() < REQUEST_TIMEOUT * 3);
    }

    #[tokio::test]
    async fn test_subscribe_to_silent_server_times_out() {
        let (listener, base) = silent_server().await;
        let _held = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });
        let api = HttpPresenceApi::new(&base, "t").unwrap();

        let started = std::time::Instant::now();
        let err = match api.subscribe("global-messages").await {
            Ok(_) => panic!("subscribe should not succeed"),
            Err(err) => err,
        };
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(started.elapsed() < CONNECT_TIMEOUT * 3);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpPresenceApi::new("not a url", "t").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
