//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use prog_helper_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match &self {
            ApiError::Port(port_error) => match port_error {
                PortError::NotFound(what) => (StatusCode::NOT_FOUND, what.clone(), None),
                PortError::Invalid(what) => (StatusCode::BAD_REQUEST, what.clone(), None),
                PortError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    "Authentication required".to_string(),
                    None,
                ),
                PortError::Forbidden(what) => (StatusCode::FORBIDDEN, what.clone(), None),
                PortError::RateLimited { retry_after_secs } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    format!(
                        "Too many requests. Please wait {} seconds before trying again.",
                        retry_after_secs
                    ),
                    Some(*retry_after_secs),
                ),
                PortError::PreconditionFailed(what) => {
                    (StatusCode::PRECONDITION_FAILED, what.clone(), None)
                }
                PortError::Unexpected(_) => {
                    // Log the detail, expose a generic message.
                    error!("Unexpected port error: {:?}", port_error);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred.".to_string(),
                        None,
                    )
                }
            },
            other => {
                error!("Internal server error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                    None,
                )
            }
        };

        let body = Json(json!({ "error": message }));
        match retry_after {
            Some(secs) => {
                (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response()
            }
            None => (status, body).into_response(),
        }
    }
}
