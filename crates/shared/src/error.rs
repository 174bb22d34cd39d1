//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types, as surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Well-formed request refused by a business rule.
    #[error("Request rejected: {message}")]
    Rejected {
        /// Machine-readable reason, e.g. `INSUFFICIENT_FUNDS`.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// Conflict with concurrent or earlier work.
    #[error("Conflict: {message}")]
    Conflict {
        /// Machine-readable reason.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// Storage is temporarily unavailable; the request may be retried.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal failure that needs operator attention.
    #[error("Internal error: {message}")]
    Internal {
        /// Machine-readable reason.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },
}

impl AppError {
    /// Shorthand for an internal error without a specific reason code.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "INTERNAL_ERROR",
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Rejected { .. } => 422,
            Self::Conflict { .. } => 409,
            Self::Unavailable(_) => 503,
            Self::Internal { .. } => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Rejected { code, .. } | Self::Conflict { code, .. } | Self::Internal { code, .. } => {
                code
            }
            Self::Unavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }

    /// Returns the message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(m) | Self::NotFound(m) | Self::Validation(m) | Self::Unavailable(m) => m,
            Self::Rejected { message, .. }
            | Self::Conflict { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(
            AppError::Rejected {
                code: "INSUFFICIENT_FUNDS",
                message: String::new()
            }
            .status_code(),
            422
        );
        assert_eq!(
            AppError::Conflict {
                code: "DUPLICATE_REQUEST",
                message: String::new()
            }
            .status_code(),
            409
        );
        assert_eq!(AppError::Unavailable(String::new()).status_code(), 503);
        assert_eq!(AppError::internal("boom").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::Rejected {
                code: "SELF_TRANSFER",
                message: String::new()
            }
            .error_code(),
            "SELF_TRANSFER"
        );
        assert_eq!(
            AppError::Unavailable(String::new()).error_code(),
            "STORAGE_UNAVAILABLE"
        );
        assert_eq!(AppError::internal("x").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_display_and_message() {
        let err = AppError::NotFound("account".into());
        assert_eq!(err.to_string(), "Not found: account");
        assert_eq!(err.message(), "account");

        let err = AppError::Internal {
            code: "PARTIALLY_COMMITTED",
            message: "history missing".into(),
        };
        assert_eq!(err.to_string(), "Internal error: history missing");
        assert_eq!(err.message(), "history missing");
    }
}
