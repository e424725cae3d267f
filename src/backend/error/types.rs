/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Types
 *
 * - `Collab` - Errors from the collaborative core (access, invites, store)
 * - `HandlerError` - Errors that occur in HTTP handlers
 * - `SerializationError` - JSON serialization errors
 *
 * # Status Mapping
 *
 * | Core error | Status |
 * |------------|--------|
 * | `NotFound` | 404 |
 * | `NotCollaborative` | 403 |
 * | `Forbidden` | 403 |
 * | `ValidationError` | 400 |
 * | `TransientIo` | 503 |
 * | `Unauthenticated` | 401 |
 * | `Expired` | 410 |
 * | `PasswordRequired` | 401 |
 * | `InvalidPassword` | 403 |
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::CollabError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use notecollab::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from the collaborative core
    #[error(transparent)]
    Collab(#[from] CollabError),

    /// Handler error (e.g., missing headers, invalid request)
    ///
    /// This error occurs when processing HTTP requests fails due to
    /// invalid input, missing headers, or other request-related issues.
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Collab(err) => match err {
                CollabError::NotFound => StatusCode::NOT_FOUND,
                CollabError::NotCollaborative => StatusCode::FORBIDDEN,
                CollabError::Forbidden { .. } => StatusCode::FORBIDDEN,
                CollabError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                CollabError::TransientIo { .. } => StatusCode::SERVICE_UNAVAILABLE,
                CollabError::Unauthenticated => StatusCode::UNAUTHORIZED,
                CollabError::Expired => StatusCode::GONE,
                CollabError::PasswordRequired => StatusCode::UNAUTHORIZED,
                CollabError::InvalidPassword => StatusCode::FORBIDDEN,
            },
            Self::HandlerError { status, .. } => *status,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::Collab(err) => err.code(),
            Self::HandlerError { status, .. } => match *status {
                StatusCode::UNAUTHORIZED => "unauthenticated",
                StatusCode::NOT_FOUND => "not_found",
                StatusCode::FORBIDDEN => "forbidden",
                status if status.is_client_error() => "bad_request",
                _ => "internal",
            },
            Self::SerializationError(_) => "internal",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::Collab(err) => match err {
                CollabError::Forbidden { message }
                | CollabError::ValidationError { message, .. } => message.clone(),
                other => other.to_string(),
            },
            Self::HandlerError { message, .. } => message.clone(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
