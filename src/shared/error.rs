//! Shared Error Types
//!
//! This module defines the error taxonomy shared between the server and the
//! collaboration client. The server converts these errors into HTTP responses
//! and the client maps HTTP responses back into them using the stable
//! [`CollabError::code`] string.
//!
//! # Error Categories
//!
//! - `NotFound` - The note id does not resolve
//! - `NotCollaborative` - The operation requires a collaborative note
//! - `Forbidden` - The principal lacks the required role
//! - `ValidationError` - Malformed input (email, expiry, missing fields)
//! - `TransientIo` - An underlying store or channel call failed
//!
//! The remaining variants cover note creation and public reads
//! (`Unauthenticated`, `Expired`, `PasswordRequired`, `InvalidPassword`).
//!
//! # Usage
//!
//! ```rust
//! use notecollab::shared::error::CollabError;
//!
//! let error = CollabError::validation("email", "Invalid email address");
//! assert_eq!(error.code(), "validation_error");
//! ```
use thiserror::Error;

/// Errors produced by the collaborative note core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollabError {
    /// Note id does not resolve
    #[error("Note not found")]
    NotFound,

    /// Operation attempted on a non-collaborative note
    #[error("This note is not a collaborative note")]
    NotCollaborative,

    /// Principal lacks the required role
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// Input validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Underlying gateway or channel call failed
    #[error("Transient I/O error: {message}")]
    TransientIo {
        /// Human-readable error message
        message: String,
    },

    /// No authenticated principal where one is required
    #[error("Login required")]
    Unauthenticated,

    /// Note exists but its expiry has passed
    #[error("Note expired")]
    Expired,

    /// Note is password protected and no password was given
    #[error("Password required")]
    PasswordRequired,

    /// Note is password protected and the password did not match
    #[error("Invalid password")]
    InvalidPassword,
}

impl CollabError {
    /// Create a new forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new transient I/O error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientIo {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotCollaborative => "not_collaborative",
            Self::Forbidden { .. } => "forbidden",
            Self::ValidationError { .. } => "validation_error",
            Self::TransientIo { .. } => "transient_io",
            Self::Unauthenticated => "unauthenticated",
            Self::Expired => "expired",
            Self::PasswordRequired => "password_required",
            Self::InvalidPassword => "invalid_password",
        }
    }

    /// Rebuild an error from its code and message
    ///
    /// Used by HTTP clients to turn an error body back into a typed error.
    /// Unknown codes become `TransientIo` so callers never lose the message.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "not_found" => Self::NotFound,
            "not_collaborative" => Self::NotCollaborative,
            "forbidden" => Self::Forbidden { message },
            "validation_error" => Self::ValidationError {
                field: String::new(),
                message,
            },
            "unauthenticated" => Self::Unauthenticated,
            "expired" => Self::Expired,
            "password_required" => Self::PasswordRequired,
            "invalid_password" => Self::InvalidPassword,
            _ => Self::TransientIo { message },
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo { .. })
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for CollabError {
    fn from(err: serde_json::Error) -> Self {
        Self::transient(format!("JSON error: {}", err))
    }
}
