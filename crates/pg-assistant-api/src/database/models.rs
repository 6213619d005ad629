use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::PgConnectOptions;
use validator::Validate;

/// Connection tuple supplied by the client on `/api/connect`.
#[derive(Clone, Deserialize, Validate, PartialEq)]
pub struct DbCredentials {
    #[validate(length(min = 1, message = "DB host is required"))]
    pub host: String,
    #[validate(range(min = 1, message = "DB port is required"))]
    pub port: u16,
    #[validate(length(min = 1, message = "DB user is required"))]
    pub user: String,
    pub password: String,
    #[validate(length(min = 1, message = "DB database is required"))]
    pub database: String,
}

impl DbCredentials {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    /// `user@host:port/database`, without the password.
    pub fn describe(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Rows of one statement, each row keyed by column name.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct QueryResult {
    /// Column order of the first row; empty for statements without rows.
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub truncated: bool,
}
