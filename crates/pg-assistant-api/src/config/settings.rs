use anyhow::{bail, Result};
use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use session_registry::RegistryConfig;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub session: RegistryConfig,
    pub database: DatabaseConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Server-side database used by `/api/test-connection`.
    pub url: Option<String>,
    pub connect_timeout_seconds: u64,
    /// Reject statements that are not read-only on `/api/run-sql`.
    pub read_only: bool,
    /// 0 = unlimited
    pub max_result_rows: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_seconds: 10,
            read_only: false,
            max_result_rows: 0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    /// Sent as `x-goog-api-key`. Takes precedence over `access_token`.
    pub api_key: Option<String>,
    /// OAuth bearer token (service account flow).
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            access_token: None,
            timeout_seconds: 60,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Settings {
    /// `.env`, then `config/settings.toml` (optional), then `APP__*` variables.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(File::with_name("config/settings").required(false))
    }

    pub fn load_from<S>(file: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.ttl_seconds == 0 {
            bail!("session.ttl_seconds must be greater than 0");
        }
        if self.session.sweep_interval_seconds == 0 {
            bail!("session.sweep_interval_seconds must be greater than 0");
        }
        if self.database.connect_timeout_seconds == 0 {
            bail!("database.connect_timeout_seconds must be greater than 0");
        }
        Ok(())
    }
}
