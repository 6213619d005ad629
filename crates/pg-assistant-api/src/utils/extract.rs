use axum::extract::FromRequest;

use super::error::ApiError;

/// `Json` body whose rejection renders as an `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
