// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use crate::auth::AuthError;

/// API error types
///
/// The auth endpoint only ever answers 200, 401 or 500, so the boundary
/// error has exactly the two failing shapes.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    InternalServer(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// JSON error response structure
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Authentication failed", msg),
            ApiError::InternalServer(msg) => {
                error!(error = %msg, "Unexpected error during request handling");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    msg,
                )
            }
        };

        let error_response = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::VerificationFailed(msg) => ApiError::Unauthorized(msg),
            other => ApiError::InternalServer(other.to_string()),
        }
    }
}
