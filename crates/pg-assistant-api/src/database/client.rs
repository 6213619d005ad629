use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::convert::rows_to_result;
use super::models::{DbCredentials, QueryResult};
use crate::config::DatabaseConfig;

const SCHEMA_QUERY: &str = r#"
    SELECT table_schema::text, table_name::text, column_name::text, data_type::text
    FROM information_schema.columns
    WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY table_schema, table_name, ordinal_position
"#;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("connection timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Everything the API needs from the target database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Open a connection with `credentials` and run `SELECT 1`.
    async fn verify(&self, credentials: &DbCredentials) -> Result<(), DatabaseError>;

    async fn run_sql(
        &self,
        credentials: &DbCredentials,
        sql: &str,
    ) -> Result<QueryResult, DatabaseError>;

    /// One line per table: `schema.table(column type, ...)`.
    async fn describe_schema(&self, credentials: &DbCredentials) -> Result<String, DatabaseError>;

    async fn server_version(&self, url: &str) -> Result<String, DatabaseError>;
}

/// Opens a fresh connection per call and closes it afterwards.
#[derive(Debug, Clone)]
pub struct PgDatabaseClient {
    connect_timeout: Duration,
    max_rows: usize,
}

impl PgDatabaseClient {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            max_rows: config.max_result_rows,
        }
    }

    async fn open<F>(&self, connect: F) -> Result<PgConnection, DatabaseError>
    where
        F: Future<Output = Result<PgConnection, sqlx::Error>>,
    {
        let conn = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| DatabaseError::Timeout(self.connect_timeout.as_secs()))??;
        Ok(conn)
    }

    async fn connect(&self, credentials: &DbCredentials) -> Result<PgConnection, DatabaseError> {
        let options = credentials.connect_options();
        self.open(PgConnection::connect_with(&options)).await
    }
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("Error while closing database connection: {}", e);
    }
}

#[async_trait]
impl DatabaseClient for PgDatabaseClient {
    async fn verify(&self, credentials: &DbCredentials) -> Result<(), DatabaseError> {
        let mut conn = self.connect(credentials).await?;
        let result = sqlx::query("SELECT 1").execute(&mut conn).await;
        close(conn).await;
        result?;
        Ok(())
    }

    async fn run_sql(
        &self,
        credentials: &DbCredentials,
        sql: &str,
    ) -> Result<QueryResult, DatabaseError> {
        let mut conn = self.connect(credentials).await?;
        let rows = conn.fetch_all(sqlx::raw_sql(sql)).await;
        close(conn).await;

        let result = rows_to_result(&rows?, self.max_rows)?;
        if result.truncated {
            warn!("Result truncated to {} rows", self.max_rows);
        }
        debug!("Query returned {} rows", result.rows.len());
        Ok(result)
    }

    async fn describe_schema(&self, credentials: &DbCredentials) -> Result<String, DatabaseError> {
        let mut conn = self.connect(credentials).await?;
        let columns = sqlx::query_as::<_, (String, String, String, String)>(SCHEMA_QUERY)
            .fetch_all(&mut conn)
            .await;
        close(conn).await;

        Ok(format_schema(&columns?))
    }

    async fn server_version(&self, url: &str) -> Result<String, DatabaseError> {
        let mut conn = self.open(PgConnection::connect(url)).await?;
        let version = sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&mut conn)
            .await;
        close(conn).await;
        Ok(version?)
    }
}

/// Group `(schema, table, column, type)` rows into one line per table.
pub fn format_schema(columns: &[(String, String, String, String)]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current: Option<(&str, &str)> = None;
    let mut fields: Vec<String> = Vec::new();

    for (schema, table, column, data_type) in columns {
        if current != Some((schema.as_str(), table.as_str())) {
            if let Some((s, t)) = current {
                lines.push(format!("{}.{}({})", s, t, fields.join(", ")));
                fields.clear();
            }
            current = Some((schema.as_str(), table.as_str()));
        }
        fields.push(format!("{} {}", column, data_type));
    }
    if let Some((s, t)) = current {
        lines.push(format!("{}.{}({})", s, t, fields.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(s: &str, t: &str, c: &str, ty: &str) -> (String, String, String, String) {
        (s.into(), t.into(), c.into(), ty.into())
    }

    #[test]
    fn test_format_schema_groups_by_table() {
        let schema = format_schema(&[
            col("public", "users", "id", "integer"),
            col("public", "users", "email", "text"),
            col("public", "orders", "id", "bigint"),
            col("sales", "orders", "total", "numeric"),
        ]);

        assert_eq!(
            schema,
            "public.users(id integer, email text)\n\
             public.orders(id bigint)\n\
             sales.orders(total numeric)"
        );
    }

    #[test]
    fn test_format_schema_empty() {
        assert_eq!(format_schema(&[]), "");
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let client = PgDatabaseClient {
            connect_timeout: Duration::from_millis(10),
            max_rows: 0,
        };
        let never = std::future::pending::<Result<PgConnection, sqlx::Error>>();
        let err = client.open(never).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Timeout(_)));
    }
}
