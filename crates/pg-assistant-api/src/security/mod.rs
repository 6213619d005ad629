pub mod bearer;
pub mod read_only;

pub use bearer::{bearer_token, AuthenticatedSession, BearerToken};
pub use read_only::is_read_only;
