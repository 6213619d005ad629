use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde::Serialize;
use session_registry::SessionRegistry;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

use crate::database::DbCredentials;
use crate::security::BearerToken;
use crate::state::AppState;
use crate::utils::{ApiError, AppJson};

#[derive(Serialize)]
pub struct ConnectResponse {
    pub status: &'static str,
    pub token: String,
    /// Seconds until the session expires.
    pub expires_in: u64,
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub status: &'static str,
    pub message: &'static str,
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

/// POST /api/connect
///
/// Credentials are checked against the server before a session exists.
pub async fn connect(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<DbCredentials>,
) -> Result<(StatusCode, Json<ConnectResponse>), ApiError> {
    credentials
        .validate()
        .map_err(|e| ApiError::BadRequest(validation_message(&e)))?;

    let target = credentials.describe();
    if let Err(e) = state.database.verify(&credentials).await {
        warn!("Connection check failed for {}: {}", target, e);
        return Err(ApiError::BadRequest(format!("Failed to connect: {}", e)));
    }

    let token = state.sessions.create(credentials);
    info!("Session {} opened for {}", token.redacted(), target);

    Ok((
        StatusCode::OK,
        Json(ConnectResponse {
            status: "success",
            token: token.into_inner(),
            expires_in: state.sessions.default_ttl().as_secs(),
        }),
    ))
}

/// POST /api/disconnect
pub async fn disconnect(
    State(sessions): State<SessionRegistry<DbCredentials>>,
    BearerToken(token): BearerToken,
) -> Json<DisconnectResponse> {
    sessions.delete(&token);

    Json(DisconnectResponse {
        status: "ok",
        message: "Session ended",
    })
}
