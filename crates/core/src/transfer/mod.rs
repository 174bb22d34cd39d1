//! Deposits and account-to-account transfers.
//!
//! A request walks `Validating -> Reserving -> Recording -> Committed`. Rejections
//! happen before any balance moves. A failed credit is compensated by re-crediting
//! the sender; a failed ledger append after balances moved surfaces as
//! `PartiallyCommitted` and can be resumed with the same idempotency key.

pub mod engine;
pub mod error;
pub mod idempotency;
pub mod retry;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::TransferEngine;
pub use error::TransferError;
pub use idempotency::{Claim, IdempotencyRecord, IdempotencyStage, IdempotencyStore};
pub use retry::RetryPolicy;
pub use types::{TransferKind, TransferReceipt, TransferRequest, TransferState};
