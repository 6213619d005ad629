use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use session_registry::token::redact;
use tracing::{debug, info, warn};

use crate::security::{is_read_only, AuthenticatedSession};
use crate::state::AppState;
use crate::utils::{ApiError, AppJson};

#[derive(Debug, Deserialize)]
pub struct RunSqlRequest {
    pub sql_query: String,
}

#[derive(Serialize)]
pub struct RunSqlResponse {
    pub status: &'static str,
    pub sql_query: String,
    pub columns: Vec<String>,
    pub results: Vec<Map<String, Value>>,
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct Nl2SqlRequest {
    pub nl_query: String,
}

#[derive(Serialize)]
pub struct Nl2SqlResponse {
    pub status: &'static str,
    pub nl_query: String,
    pub sql_query: String,
    /// Whether the generated statement would pass the read-only guard.
    pub read_only: bool,
}

/// POST /api/run-sql
pub async fn run_sql(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    AppJson(request): AppJson<RunSqlRequest>,
) -> Result<Json<RunSqlResponse>, ApiError> {
    let sql = request.sql_query.trim();
    if sql.is_empty() {
        return Err(ApiError::BadRequest("sql_query is required".to_string()));
    }

    if state.settings.database.read_only && !is_read_only(sql) {
        return Err(ApiError::Forbidden(
            "Server is in read-only mode; only read queries are allowed".to_string(),
        ));
    }

    info!("Session {} running SQL on {}", redact(&session.token), session.credentials.describe());
    debug!("SQL: {}", sql);

    let result = state
        .database
        .run_sql(&session.credentials, sql)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Query execution failed: {}", e)))?;

    Ok(Json(RunSqlResponse {
        status: "success",
        sql_query: request.sql_query,
        columns: result.columns,
        results: result.rows,
        truncated: result.truncated,
    }))
}

/// POST /api/nl2sql
pub async fn nl2sql(
    State(state): State<AppState>,
    session: AuthenticatedSession,
    AppJson(request): AppJson<Nl2SqlRequest>,
) -> Result<Json<Nl2SqlResponse>, ApiError> {
    if request.nl_query.trim().is_empty() {
        return Err(ApiError::BadRequest("nl_query is required".to_string()));
    }

    // Generation still works without schema context, only less accurately.
    let schema_info = match state.database.describe_schema(&session.credentials).await {
        Ok(schema) => schema,
        Err(e) => {
            warn!("Schema lookup failed for {}: {}", session.credentials.describe(), e);
            String::new()
        }
    };

    let sql_query = state
        .generator
        .generate_sql(&request.nl_query, &schema_info)
        .await?;
    info!("Generated SQL for session {}", redact(&session.token));

    Ok(Json(Nl2SqlResponse {
        status: "success",
        read_only: is_read_only(&sql_query),
        nl_query: request.nl_query,
        sql_query,
    }))
}
