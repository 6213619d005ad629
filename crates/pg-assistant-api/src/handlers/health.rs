use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    active_sessions: usize,
}

#[derive(Serialize)]
pub struct PingResponse {
    message: &'static str,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestConnectionResponse {
    Success { postgres_version: String },
    Error { details: String },
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            active_sessions: state.sessions.len(),
        }),
    )
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "Postgres Assistant backend is running!",
    })
}

/// Always 200; failures are reported in the body.
pub async fn test_connection(State(state): State<AppState>) -> Json<TestConnectionResponse> {
    let Some(url) = state.settings.database.url.as_deref() else {
        return Json(TestConnectionResponse::Error {
            details: "database.url is not configured".to_string(),
        });
    };

    match state.database.server_version(url).await {
        Ok(postgres_version) => Json(TestConnectionResponse::Success { postgres_version }),
        Err(e) => {
            warn!("Test connection failed: {}", e);
            Json(TestConnectionResponse::Error {
                details: e.to_string(),
            })
        }
    }
}
