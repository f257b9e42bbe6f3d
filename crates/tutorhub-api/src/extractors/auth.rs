//! `AuthUser` extractor: resolves the caller from a JWT access token.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use tutorhub_core::error::AppError;
use tutorhub_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller available in handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// Subject of the access token.
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    /// Reads `Authorization: Bearer <jwt>`, falling back to `?token=<jwt>`
    /// for WebSocket upgrades and unload beacons, which cannot set headers.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
                .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?,
            None => Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .ok_or_else(|| AppError::authentication("Missing access token"))?,
        };

        let claims = state.jwt_decoder.decode_access_token(&token)?;
        Ok(AuthUser {
            user_id: claims.user_id(),
        })
    }
}
