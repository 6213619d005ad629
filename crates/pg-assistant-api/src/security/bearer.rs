use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use session_registry::{token::redact, SessionRegistry};
use tracing::debug;

use crate::database::DbCredentials;
use crate::utils::error::ApiError;

const BEARER_PREFIX: &str = "bearer ";

/// Token from `Authorization: Bearer <token>`; the registry is not consulted.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// A bearer token that resolved to a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub token: String,
    pub credentials: DbCredentials,
}

/// Extract the token part of a bearer `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header format".to_string()))?;

    match value.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            Ok(value[BEARER_PREFIX.len()..].trim().to_string())
        }
        _ => Err(ApiError::Unauthorized(
            "Invalid Authorization header format".to_string(),
        )),
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(BearerToken)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedSession
where
    S: Send + Sync,
    SessionRegistry<DbCredentials>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let sessions = SessionRegistry::<DbCredentials>::from_ref(state);

        match sessions.get(&token) {
            Some(credentials) => {
                debug!("Session {} resolved to {}", redact(&token), credentials.describe());
                Ok(AuthenticatedSession { token, credentials })
            }
            None => Err(ApiError::Unauthorized(
                "Invalid or expired session token".to_string(),
            )),
        }
    }
}
