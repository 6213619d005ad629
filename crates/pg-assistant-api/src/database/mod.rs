pub mod client;
pub mod convert;
pub mod models;

pub use client::{DatabaseClient, DatabaseError, PgDatabaseClient};
pub use models::{DbCredentials, QueryResult};

#[cfg(test)]
pub use client::MockDatabaseClient;
