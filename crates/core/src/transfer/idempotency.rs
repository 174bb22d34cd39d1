//! Idempotency keys for transfer requests.
//!
//! A key is claimed before any validation touches storage. Its stage records how
//! far the associated request got, so a retry either replays the stored receipt,
//! resumes at the recording step, or is told the first attempt is still running.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tellr_shared::types::{CorrelationId, UserId};

use super::types::TransferReceipt;
use crate::error::StoreError;

/// How far the request behind a key has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStage {
    /// Claimed; balances may be moving right now.
    Pending,
    /// Balances moved; ledger entries may be missing.
    BalancesApplied,
    /// Finished; the receipt is stored.
    Committed,
}

impl IdempotencyStage {
    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::BalancesApplied => "balances_applied",
            Self::Committed => "committed",
        }
    }
}

impl std::str::FromStr for IdempotencyStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "balances_applied" => Ok(Self::BalancesApplied),
            "committed" => Ok(Self::Committed),
            _ => Err(format!("Unknown idempotency stage: {s}")),
        }
    }
}

/// Stored state of one idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    /// Customer that owns the key. Keys are scoped per customer.
    pub owner: UserId,
    /// Client-chosen key.
    pub key: String,
    /// Correlation ID assigned on the first attempt.
    pub correlation_id: CorrelationId,
    /// Payload fingerprint of the first attempt.
    pub fingerprint: String,
    /// Progress.
    pub stage: IdempotencyStage,
    /// Present once `stage` is `Committed`.
    pub receipt: Option<TransferReceipt>,
}

/// Result of claiming a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The key was unused and is now `Pending` for this request.
    Fresh,
    /// The key was already claimed.
    Existing(IdempotencyRecord),
}

/// Storage seam for idempotency keys.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically claims `key` for `owner`, or returns the existing record.
    async fn claim(
        &self,
        owner: UserId,
        key: &str,
        correlation_id: CorrelationId,
        fingerprint: &str,
    ) -> Result<Claim, StoreError>;

    /// Records that balances have moved.
    async fn mark_applied(&self, owner: UserId, key: &str) -> Result<(), StoreError>;

    /// Records the receipt and marks the key committed.
    async fn complete(
        &self,
        owner: UserId,
        key: &str,
        receipt: &TransferReceipt,
    ) -> Result<(), StoreError>;

    /// Forgets the key so it can be used again.
    async fn release(&self, owner: UserId, key: &str) -> Result<(), StoreError>;
}
