use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tellr_shared::types::{CorrelationId, EntryId};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::ledger::{EntryCursor, EntryQuery, Ledger, LedgerEntry, NewEntry};

/// Entries held in a vector behind an async read/write lock.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries appended so far.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing has been appended.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append_all(&self, entries: Vec<NewEntry>) -> Result<Vec<LedgerEntry>, StoreError> {
        // Same precision as the SQL backends.
        let recorded_at = Utc::now().trunc_subsecs(6);
        let written: Vec<LedgerEntry> = entries
            .into_iter()
            .map(|entry| entry.into_entry(EntryId::new(), recorded_at))
            .collect();

        // One entry per (movement, kind), as the unique index enforces in SQL.
        let mut stored = self.entries.write().await;
        let taken = stored.iter().any(|existing| {
            written.iter().any(|new| {
                new.correlation_id == existing.correlation_id && new.kind == existing.kind
            })
        });
        if taken {
            return Err(StoreError::Duplicate);
        }
        stored.extend(written.iter().cloned());
        Ok(written)
    }

    async fn page(
        &self,
        query: &EntryQuery,
        after: Option<EntryCursor>,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = self.entries.read().await;
        let mut selected: Vec<LedgerEntry> = entries
            .iter()
            .filter(|entry| query.matches(entry) && after.is_none_or(|c| entry.cursor() > c))
            .cloned()
            .collect();
        selected.sort_by_key(LedgerEntry::cursor);
        selected.truncate(limit);
        Ok(selected)
    }

    async fn by_correlation(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| entry.correlation_id == correlation_id)
            .cloned()
            .collect())
    }
}
