//! Idempotency key repository backed by the `idempotency_keys` table.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tellr_core::StoreError;
use tellr_core::transfer::{
    Claim, IdempotencyRecord, IdempotencyStage, IdempotencyStore, TransferReceipt,
};
use tellr_shared::types::{CorrelationId, UserId};

use crate::entities::idempotency_keys::{self, KeyStage};
use crate::error::store_error;

/// Idempotency key repository implementing [`IdempotencyStore`].
#[derive(Debug, Clone)]
pub struct IdempotencyRepository {
    db: DatabaseConnection,
}

impl IdempotencyRepository {
    /// Creates a new idempotency key repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the record for a key.
    pub async fn find(
        &self,
        owner: UserId,
        key: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        idempotency_keys::Entity::find_by_id((owner.into_inner(), key.to_string()))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(into_record)
            .transpose()
    }

    async fn set_stage(
        &self,
        owner: UserId,
        key: &str,
        stage: KeyStage,
        receipt: Option<String>,
    ) -> Result<(), StoreError> {
        let mut changes = idempotency_keys::ActiveModel {
            stage: Set(stage),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if receipt.is_some() {
            changes.receipt = Set(receipt);
        }

        let result = idempotency_keys::Entity::update_many()
            .set(changes)
            .filter(idempotency_keys::Column::OwnerId.eq(owner.into_inner()))
            .filter(idempotency_keys::Column::IdempotencyKey.eq(key))
            .exec(&self.db)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn into_record(row: idempotency_keys::Model) -> Result<IdempotencyRecord, StoreError> {
    let receipt = row
        .receipt
        .as_deref()
        .map(serde_json::from_str::<TransferReceipt>)
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("stored receipt is unreadable: {e}")))?;

    Ok(IdempotencyRecord {
        owner: UserId::from_uuid(row.owner_id),
        key: row.idempotency_key,
        correlation_id: CorrelationId::from_uuid(row.correlation_id),
        fingerprint: row.fingerprint,
        stage: IdempotencyStage::from(row.stage),
        receipt,
    })
}

#[async_trait]
impl IdempotencyStore for IdempotencyRepository {
    async fn claim(
        &self,
        owner: UserId,
        key: &str,
        correlation_id: CorrelationId,
        fingerprint: &str,
    ) -> Result<Claim, StoreError> {
        let now = Utc::now();
        let model = idempotency_keys::ActiveModel {
            owner_id: Set(owner.into_inner()),
            idempotency_key: Set(key.to_string()),
            correlation_id: Set(correlation_id.into_inner()),
            fingerprint: Set(fingerprint.to_string()),
            stage: Set(KeyStage::Pending),
            receipt: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = idempotency_keys::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    idempotency_keys::Column::OwnerId,
                    idempotency_keys::Column::IdempotencyKey,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(store_error)?;

        if inserted > 0 {
            return Ok(Claim::Fresh);
        }

        // Lost the race to another claim, or the key was released in between.
        self.find(owner, key)
            .await?
            .map(Claim::Existing)
            .ok_or(StoreError::Busy)
    }

    async fn mark_applied(&self, owner: UserId, key: &str) -> Result<(), StoreError> {
        self.set_stage(owner, key, KeyStage::BalancesApplied, None)
            .await
    }

    async fn complete(
        &self,
        owner: UserId,
        key: &str,
        receipt: &TransferReceipt,
    ) -> Result<(), StoreError> {
        let receipt = serde_json::to_string(receipt)
            .map_err(|e| StoreError::Corrupt(format!("receipt cannot be stored: {e}")))?;
        self.set_stage(owner, key, KeyStage::Committed, Some(receipt))
            .await
    }

    async fn release(&self, owner: UserId, key: &str) -> Result<(), StoreError> {
        idempotency_keys::Entity::delete_many()
            .filter(idempotency_keys::Column::OwnerId.eq(owner.into_inner()))
            .filter(idempotency_keys::Column::IdempotencyKey.eq(key))
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
