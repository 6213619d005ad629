pub mod nl2sql;

pub use nl2sql::{GeminiSqlGenerator, SqlGenerator};

#[cfg(test)]
pub use nl2sql::MockSqlGenerator;
