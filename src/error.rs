use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ApiError
///
/// The client-visible failure taxonomy. Every authorization failure is a
/// terminal, non-retriable rejection: `Forbidden` carries the human-readable
/// denial reason, `Validation` covers rejected payloads (notably the duplicate
/// application check), and `NotFound` covers references to rows that do not
/// exist or are not visible to the caller.
///
/// Database and upstream failures are logged server-side and surfaced as
/// opaque 5xx responses so internals never leak to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found.")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("auth provider request failed: {0}")]
    AuthProvider(#[from] reqwest::Error),

    /// The external auth provider rejected the request (bad credentials,
    /// duplicate email, weak password).
    #[error("{0}")]
    AuthRejected(String),
}

/// ErrorBody
///
/// JSON envelope for every error response: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason),
            ApiError::Validation(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::AuthRejected(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found.".to_string()),
            ApiError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            ApiError::AuthProvider(e) => {
                tracing::error!("auth provider error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Auth provider unavailable.".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
