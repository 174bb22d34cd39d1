//! JSON error responses.
//!
//! Every failure leaves the API as `{ "error": CODE, "message": text }` with the
//! status its domain error maps to.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tellr_core::StoreError;
use tellr_core::account::AccountError;
use tellr_core::statement::StatementError;
use tellr_core::transfer::TransferError;
use tellr_shared::AppError;
use tracing::error;

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub(crate) fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message: message.into(),
        }
    }

    /// Malformed request input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::new(err.status_code(), err.error_code(), err.message())
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        Self::new(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let status = match err {
            AccountError::NotFound(_) => 404,
            AccountError::NegativeInitialDeposit(_) => 400,
            AccountError::NonZeroBalance { .. } | AccountError::AlreadyClosed(_) => 422,
            AccountError::Storage(source) => return source.into(),
        };
        Self::new(status, err.error_code(), err.to_string())
    }
}

impl From<StatementError> for ApiError {
    fn from(err: StatementError) -> Self {
        match err {
            StatementError::NoAccounts(_) => Self::new(404, err.error_code(), err.to_string()),
            StatementError::InvalidPeriod { .. } => {
                Self::new(400, err.error_code(), err.to_string())
            }
            StatementError::TotalOverflow => Self::new(422, err.error_code(), err.to_string()),
            StatementError::Storage(source) => source.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if matches!(err, StoreError::Busy | StoreError::Unavailable(_)) {
            AppError::Unavailable(err.to_string()).into()
        } else {
            error!(error = %err, "Storage failure");
            AppError::internal(err.to_string()).into()
        }
    }
}
