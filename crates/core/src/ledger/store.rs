//! Storage seam for ledger entries.

use async_trait::async_trait;
use tellr_shared::types::CorrelationId;

use super::types::{EntryCursor, EntryQuery, LedgerEntry, NewEntry};
use crate::error::StoreError;

/// Append-only store of ledger entries.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Appends a batch atomically: either every entry is visible to readers or none is.
    ///
    /// Entries in one batch share a `recorded_at` and receive increasing IDs.
    async fn append_all(&self, entries: Vec<NewEntry>) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Appends a single entry.
    async fn append(&self, entry: NewEntry) -> Result<LedgerEntry, StoreError> {
        self.append_all(vec![entry])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Corrupt("append returned no entry".to_string()))
    }

    /// Returns up to `limit` entries matching `query`, strictly after `after`, in ledger order.
    async fn page(
        &self,
        query: &EntryQuery,
        after: Option<EntryCursor>,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Returns every entry written for one money movement.
    async fn by_correlation(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Vec<LedgerEntry>, StoreError>;
}
