pub mod error;
pub mod extract;
pub mod logger;

pub use error::ApiError;
pub use extract::AppJson;
