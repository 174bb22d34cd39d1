//! Transfer error taxonomy.
//!
//! Rejections happen before any balance changes and are safe to retry after
//! fixing the input. Everything else is a failure with a distinct recovery path.

use tellr_shared::types::{AccountId, CorrelationId, Money};
use thiserror::Error;

use super::types::TransferState;
use crate::error::StoreError;

/// Errors that can occur while executing a deposit or transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    // ========== Rejections ==========
    /// Amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Money),

    /// Sender and recipient are the same account.
    #[error("Cannot transfer to the same account")]
    SelfTransfer,

    /// A transfer was submitted without a recipient.
    #[error("Transfer requires a recipient account")]
    MissingRecipient,

    /// Recipient does not exist or is not active.
    #[error("Recipient account {0} not found or not active")]
    UnknownRecipient(AccountId),

    /// Sender does not exist or is not owned by the initiator.
    #[error("Account {0} not found")]
    SenderNotFound(AccountId),

    /// Sender exists but is inactive or closed.
    #[error("Account {0} is not active")]
    SenderInactive(AccountId),

    /// The debit would overdraw the sender.
    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The sender.
        account_id: AccountId,
        /// Balance at the time of the attempt.
        balance: Money,
        /// Amount requested.
        requested: Money,
    },

    // ========== Failures ==========
    /// Storage failed before any balance moved.
    #[error("Storage failure while {step}: {source}")]
    Storage {
        /// Step that failed.
        step: TransferState,
        /// Underlying error.
        source: StoreError,
    },

    /// Crediting the recipient failed; the sender was re-credited.
    #[error("Transfer {correlation_id} failed and was rolled back: {source}")]
    Compensated {
        /// Movement that was rolled back.
        correlation_id: CorrelationId,
        /// Why the credit failed.
        source: StoreError,
    },

    /// Balances moved but the ledger entries were not written.
    #[error("Transfer {correlation_id} moved balances but history was not recorded: {source}")]
    PartiallyCommitted {
        /// Movement needing reconciliation.
        correlation_id: CorrelationId,
        /// Accounts whose balances changed.
        accounts: Vec<AccountId>,
        /// Why the append failed.
        source: StoreError,
    },

    /// Crediting the recipient failed and so did the compensating re-credit.
    #[error(
        "Transfer {correlation_id} debited {sender} by {amount} and could not be rolled back: \
         credit failed ({credit_error}), compensation failed ({compensation_error})"
    )]
    DoubleFailure {
        /// Movement needing manual repair.
        correlation_id: CorrelationId,
        /// Account left short.
        sender: AccountId,
        /// Amount missing from the sender.
        amount: Money,
        /// Why the credit failed.
        credit_error: StoreError,
        /// Why the compensation failed.
        compensation_error: StoreError,
    },

    // ========== Idempotency ==========
    /// Another request with the same key is still running.
    #[error("A request with idempotency key '{0}' is already in progress")]
    DuplicateRequest(String),

    /// The key was already used for a different payload.
    #[error("Idempotency key '{0}' was already used for a different request")]
    IdempotencyKeyReused(String),

    /// The background task running the transfer died.
    #[error("Transfer task aborted: {0}")]
    Aborted(String),
}

impl TransferError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SelfTransfer => "SELF_TRANSFER",
            Self::MissingRecipient => "MISSING_RECIPIENT",
            Self::UnknownRecipient(_) => "UNKNOWN_RECIPIENT",
            Self::SenderNotFound(_) => "SENDER_NOT_FOUND",
            Self::SenderInactive(_) => "SENDER_INACTIVE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Storage { .. } => "STORAGE_UNAVAILABLE",
            Self::Compensated { .. } => "TRANSFER_ROLLED_BACK",
            Self::PartiallyCommitted { .. } => "PARTIALLY_COMMITTED",
            Self::DoubleFailure { .. } => "DOUBLE_FAILURE",
            Self::DuplicateRequest(_) => "DUPLICATE_REQUEST",
            Self::IdempotencyKeyReused(_) => "IDEMPOTENCY_KEY_REUSED",
            Self::Aborted(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidAmount(_) | Self::SelfTransfer | Self::MissingRecipient => 400,

            // 404 Not Found
            Self::SenderNotFound(_) => 404,

            // 422 Unprocessable - refused by a business rule
            Self::UnknownRecipient(_)
            | Self::SenderInactive(_)
            | Self::InsufficientFunds { .. }
            | Self::IdempotencyKeyReused(_) => 422,

            // 409 Conflict
            Self::DuplicateRequest(_) => 409,

            // 503 Service Unavailable - nothing moved, retry later
            Self::Storage { .. } | Self::Compensated { .. } => 503,

            // 500 Internal Server Error - needs reconciliation
            Self::PartiallyCommitted { .. } | Self::DoubleFailure { .. } | Self::Aborted(_) => 500,
        }
    }

    /// Returns true if resubmitting the same request may succeed.
    ///
    /// `PartiallyCommitted` is retryable only with the same idempotency key.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::Compensated { .. }
                | Self::DuplicateRequest(_)
                | Self::PartiallyCommitted { .. }
        )
    }

    /// Returns true if the request was refused before any balance changed.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::SelfTransfer
                | Self::MissingRecipient
                | Self::UnknownRecipient(_)
                | Self::SenderNotFound(_)
                | Self::SenderInactive(_)
                | Self::InsufficientFunds { .. }
        )
    }

    /// Terminal state of the state machine for this error.
    #[must_use]
    pub const fn final_state(&self) -> TransferState {
        if self.is_rejection() {
            TransferState::Rejected
        } else {
            TransferState::Failed
        }
    }

    /// Returns true if balances may have changed without matching ledger entries.
    #[must_use]
    pub const fn needs_reconciliation(&self) -> bool {
        matches!(
            self,
            Self::PartiallyCommitted { .. } | Self::DoubleFailure { .. } | Self::Aborted(_)
        )
    }
}
