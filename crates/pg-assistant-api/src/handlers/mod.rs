pub mod health;
pub mod query;
pub mod session;

pub use health::{health_check, ping, test_connection};
pub use query::{nl2sql, run_sql};
pub use session::{connect, disconnect};
