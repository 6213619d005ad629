use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::GeminiConfig;
use crate::utils::error::ApiError;

/// Turns a natural-language request into PostgreSQL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate_sql(&self, nl_query: &str, schema_info: &str) -> Result<String, ApiError>;
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiSqlGenerator {
    client: Client,
    config: GeminiConfig,
}

impl GeminiSqlGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

pub fn build_prompt(nl_query: &str, schema_info: &str) -> String {
    format!(
        "Convert the following natural language request into a valid PostgreSQL SQL query, \
         or if the request is a general database question, answer it in plain text and ignore \
         the schema below.\n\
         Database schema info:\n{}\n\n\
         User request:\n{}\n\n\
         SQL query:\n",
        schema_info, nl_query
    )
}

/// Strip a markdown code fence (optionally tagged `sql`) around the answer.
pub fn clean_generated_sql(raw: &str) -> String {
    let text = raw.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text.to_string();
    };

    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = match body.get(..3) {
        Some(tag) if tag.eq_ignore_ascii_case("sql") => &body[3..],
        _ => body,
    };
    body.trim().to_string()
}

#[async_trait]
impl SqlGenerator for GeminiSqlGenerator {
    async fn generate_sql(&self, nl_query: &str, schema_info: &str) -> Result<String, ApiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(nl_query, schema_info),
                }],
            }],
        };

        let builder = self.client.post(self.endpoint()).json(&request);
        let builder = match (&self.config.api_key, &self.config.access_token) {
            (Some(key), _) => builder.header("x-goog-api-key", key),
            (None, Some(token)) => builder.bearer_auth(token),
            (None, None) => {
                return Err(ApiError::LlmError(
                    "Gemini credentials are not configured".to_string(),
                ))
            }
        };

        debug!("Requesting SQL from {}", self.config.model);
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::LlmError(format!("Gemini Network Error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini returned {}: {}", status, body);
            return Err(ApiError::LlmError(format!(
                "Gemini API Error ({}): {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ApiError::LlmError(format!("Failed to parse Gemini response: {}", e)))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ApiError::LlmError("Unexpected Gemini response format".to_string()))?;

        Ok(clean_generated_sql(&text))
    }
}
