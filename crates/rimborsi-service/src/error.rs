//! API error types and responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rimborsi_core::ValidationError;
use rimborsi_store::StoreError;
use serde::Serialize;

/// Characters of an internal error message shown to callers.
const INTERNAL_MESSAGE_CHARS: usize = 20;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or wrong bearer token, or wrong admin token.
    #[error("Not authorized")]
    Unauthorized,

    /// Rate limit exceeded.
    #[error("Too many requests")]
    TooManyRequests,

    /// Malformed or incomplete input.
    #[error("Bad request: {0}")]
    InvalidInput(String),

    /// A person or entry named by the request does not exist.
    #[error("Bad request: {0}")]
    UnknownReference(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An attachment exceeds a size budget.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The people roster has not been initialized.
    #[error("Not ready")]
    NotReady,

    /// Stored data violates an invariant.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Turn an unknown reference into a plain 404, for read-only lookups of a
    /// single resource.
    #[must_use]
    pub fn into_not_found(self) -> Self {
        match self {
            Self::UnknownReference(msg) => Self::NotFound(msg),
            other => other,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized", self.to_string()),
            Self::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_requests",
                self.to_string(),
            ),
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input", self.to_string()),
            Self::UnknownReference(_) => (StatusCode::BAD_REQUEST, "not_found", self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            Self::PayloadTooLarge(_) => (
                StatusCode::BAD_REQUEST,
                "payload_too_large",
                self.to_string(),
            ),
            Self::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready",
                self.to_string(),
            ),
            Self::DataCorruption(msg) => {
                tracing::error!(error = %msg, "Data corruption detected");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "data_corruption",
                    "Stored data is inconsistent".to_string(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                let short: String = msg.chars().take(INTERNAL_MESSAGE_CHARS).collect();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    format!("Internal error: {short}"),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                Self::UnknownReference(format!("{entity} not found: {id}"))
            }
            StoreError::NotReady => Self::NotReady,
            StoreError::Unauthorized => Self::Unauthorized,
            StoreError::DataCorruption(msg) => Self::DataCorruption(msg),
            StoreError::Validation(err) => err.into(),
            StoreError::Database(msg)
            | StoreError::Serialization(msg)
            | StoreError::Archive(msg) => Self::Internal(msg),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::PayloadTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(format!("invalid payload: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}
