//! Application-wide error types.
//!
//! Domain crates map their own error enums into `AppError` at the HTTP boundary.
//! Every variant carries a machine-readable code and a human message.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Malformed input or a violated business rule.
    #[error("{message}")]
    BadRequest {
        /// Stable error code, e.g. `INVALID_AMOUNT`.
        code: &'static str,
        /// Human readable message.
        message: String,
    },

    /// Referenced resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Stable error code, e.g. `RECEIPT_NOT_FOUND`.
        code: &'static str,
        /// Human readable message.
        message: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a `BadRequest` error.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// Builds a `NotFound` error.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// Builds an error from a domain error's status, code, and message.
    pub fn from_domain(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound { code, message },
            500.. if code == "DATABASE_ERROR" => Self::Database(message),
            500.. => Self::Internal(message),
            _ => Self::BadRequest { code, message },
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::BadRequest { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest { code, .. } | Self::NotFound { code, .. } => *code,
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors that are the server's fault.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
