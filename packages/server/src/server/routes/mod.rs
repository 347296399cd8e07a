pub mod health;
pub mod mugshots;
pub mod payments;
pub mod session;

pub use health::health_handler;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error body for non-gate failures.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Map an unexpected failure to a generic 500 without leaking internals.
pub fn internal_error(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "Request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
