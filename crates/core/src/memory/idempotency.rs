use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tellr_shared::types::{CorrelationId, UserId};

use crate::error::StoreError;
use crate::transfer::{Claim, IdempotencyRecord, IdempotencyStage, IdempotencyStore, TransferReceipt};

/// Idempotency keys held in a concurrent hash map, scoped by owner.
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    records: DashMap<(UserId, String), IdempotencyRecord>,
}

impl MemoryIdempotencyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current record for a key.
    #[must_use]
    pub fn record(&self, owner: UserId, key: &str) -> Option<IdempotencyRecord> {
        self.records
            .get(&(owner, key.to_string()))
            .map(|record| record.clone())
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn claim(
        &self,
        owner: UserId,
        key: &str,
        correlation_id: CorrelationId,
        fingerprint: &str,
    ) -> Result<Claim, StoreError> {
        match self.records.entry((owner, key.to_string())) {
            Entry::Occupied(existing) => Ok(Claim::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(IdempotencyRecord {
                    owner,
                    key: key.to_string(),
                    correlation_id,
                    fingerprint: fingerprint.to_string(),
                    stage: IdempotencyStage::Pending,
                    receipt: None,
                });
                Ok(Claim::Fresh)
            }
        }
    }

    async fn mark_applied(&self, owner: UserId, key: &str) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(&(owner, key.to_string()))
            .ok_or(StoreError::NotFound)?;
        record.stage = IdempotencyStage::BalancesApplied;
        Ok(())
    }

    async fn complete(
        &self,
        owner: UserId,
        key: &str,
        receipt: &TransferReceipt,
    ) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(&(owner, key.to_string()))
            .ok_or(StoreError::NotFound)?;
        record.stage = IdempotencyStage::Committed;
        record.receipt = Some(receipt.clone());
        Ok(())
    }

    async fn release(&self, owner: UserId, key: &str) -> Result<(), StoreError> {
        self.records.remove(&(owner, key.to_string()));
        Ok(())
    }
}
