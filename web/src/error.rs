//! Error types for web handlers.
//!
//! This module bridges converter errors and HTTP responses, implementing
//! Axum's `IntoResponse` trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use entity_binding_core::binding::FieldError;
use entity_binding_core::error::ConverterError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps converter failures and provides HTTP-friendly error responses.
///
/// # Status mapping
///
/// | Converter error | Status | Code |
/// |-----------------|--------|------|
/// | `Configuration` | 500 | `CONFIGURATION_ERROR` |
/// | `EntityNotFound` | 404 | `NOT_FOUND` |
/// | `Validation` | 422 | `VALIDATION_ERROR` |
/// | `Deletion` (lock conflict) | 409 | `CONFLICT` |
/// | `Deletion` | 500 | `DELETION_FAILED` |
/// | `Storage` (lock conflict) | 409 | `CONFLICT` |
/// | `Storage` | 500 | `STORAGE_ERROR` |
///
/// The layer itself answers 400 `BAD_REQUEST` for undecodable input and
/// 413 `PAYLOAD_TOO_LARGE` for bodies over its limit.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Field errors (validation failures only)
    errors: Vec<FieldError>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            errors: Vec::new(),
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach field errors to the response body.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 413 Payload Too Large error.
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            message.into(),
            "PAYLOAD_TOO_LARGE".to_string(),
        )
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Field errors carried by a validation failure.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
    /// Field errors, omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Map converter failures onto HTTP responses.
impl From<ConverterError> for AppError {
    fn from(err: ConverterError) -> Self {
        let conflict = err.is_conflict();

        match err {
            ConverterError::Configuration(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The request could not be bound to an entity".to_string(),
                "CONFIGURATION_ERROR".to_string(),
            )
            .with_source(err.into()),
            ConverterError::EntityNotFound { ref message, .. } => {
                Self::not_found(message.clone())
            }
            ConverterError::Validation { message, errors } => {
                Self::validation(message).with_errors(errors)
            }
            ConverterError::Deletion { ref message, .. } if conflict => {
                Self::conflict(message.clone()).with_source(err.into())
            }
            ConverterError::Deletion { ref message, .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                message.clone(),
                "DELETION_FAILED".to_string(),
            )
            .with_source(err.into()),
            ConverterError::Storage { ref message, .. } if conflict => {
                Self::conflict(message.clone()).with_source(err.into())
            }
            ConverterError::Storage { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "A storage error occurred".to_string(),
                "STORAGE_ERROR".to_string(),
            )
            .with_source(err.into()),
        }
    }
}
