//! Ledger repository backed by the `ledger_entries` table.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use tellr_core::StoreError;
use tellr_core::ledger::{EntryCursor, EntryQuery, Ledger, LedgerEntry, NewEntry};
use tellr_shared::types::{CorrelationId, EntryId};

use crate::entities::ledger_entries;
use crate::error::store_error;

/// Ledger repository implementing [`Ledger`]. Rows are only ever inserted.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_active_model(entry: &LedgerEntry) -> Result<ledger_entries::ActiveModel, StoreError> {
    let amount_minor = entry
        .amount
        .to_minor_units()
        .map_err(|e| StoreError::Corrupt(format!("amount cannot be stored: {e}")))?;

    Ok(ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        account_id: Set(entry.account_id.into_inner()),
        counterparty_id: Set(entry.counterparty_id.map(|id| id.into_inner())),
        correlation_id: Set(entry.correlation_id.into_inner()),
        kind: Set(entry.kind.into()),
        amount_minor: Set(amount_minor),
        category: Set(entry.category.clone()),
        occurred_at: Set(entry.occurred_at),
        description: Set(entry.description.clone()),
        recorded_at: Set(entry.recorded_at),
    })
}

/// Rows strictly after `cursor` in (`occurred_at`, `recorded_at`, `id`) order.
fn after_cursor(cursor: EntryCursor) -> Condition {
    use ledger_entries::Column;

    Condition::any()
        .add(Column::OccurredAt.gt(cursor.occurred_at))
        .add(
            Condition::all()
                .add(Column::OccurredAt.eq(cursor.occurred_at))
                .add(Column::RecordedAt.gt(cursor.recorded_at)),
        )
        .add(
            Condition::all()
                .add(Column::OccurredAt.eq(cursor.occurred_at))
                .add(Column::RecordedAt.eq(cursor.recorded_at))
                .add(Column::Id.gt(cursor.id.into_inner())),
        )
}

#[async_trait]
impl Ledger for LedgerRepository {
    async fn append_all(&self, entries: Vec<NewEntry>) -> Result<Vec<LedgerEntry>, StoreError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let recorded_at = Utc::now().trunc_subsecs(6);
        let written: Vec<LedgerEntry> = entries
            .into_iter()
            .map(|entry| entry.into_entry(EntryId::new(), recorded_at))
            .collect();
        let models = written
            .iter()
            .map(to_active_model)
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self.db.begin().await.map_err(store_error)?;
        ledger_entries::Entity::insert_many(models)
            .exec_without_returning(&txn)
            .await
            .map_err(store_error)?;
        txn.commit().await.map_err(store_error)?;

        Ok(written)
    }

    async fn page(
        &self,
        query: &EntryQuery,
        after: Option<EntryCursor>,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        use ledger_entries::Column;

        let mut select = ledger_entries::Entity::find().filter(
            Column::AccountId.is_in(query.accounts.iter().map(|id| id.into_inner())),
        );
        if let Some(start) = query.range.start {
            select = select.filter(Column::OccurredAt.gte(start));
        }
        if let Some(end) = query.range.end {
            select = select.filter(Column::OccurredAt.lt(end));
        }
        if let Some(cursor) = after {
            select = select.filter(after_cursor(cursor));
        }

        let rows = select
            .order_by_asc(Column::OccurredAt)
            .order_by_asc(Column::RecordedAt)
            .order_by_asc(Column::Id)
            .limit(u64::try_from(limit).unwrap_or(u64::MAX))
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(ledger_entries::Model::into_domain).collect())
    }

    async fn by_correlation(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::CorrelationId.eq(correlation_id.into_inner()))
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(ledger_entries::Model::into_domain).collect())
    }
}
