//! `SeaORM` Entity for idempotency_keys table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tellr_core::transfer::IdempotencyStage;

/// Stored progress of the request behind a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum KeyStage {
    /// Claimed.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Balances moved.
    #[sea_orm(string_value = "balances_applied")]
    BalancesApplied,
    /// Receipt stored.
    #[sea_orm(string_value = "committed")]
    Committed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "idempotency_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub idempotency_key: String,
    pub correlation_id: Uuid,
    pub fingerprint: String,
    pub stage: KeyStage,
    /// Serialized receipt, set once committed.
    #[sea_orm(column_type = "Text", nullable)]
    pub receipt: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<KeyStage> for IdempotencyStage {
    fn from(stage: KeyStage) -> Self {
        match stage {
            KeyStage::Pending => Self::Pending,
            KeyStage::BalancesApplied => Self::BalancesApplied,
            KeyStage::Committed => Self::Committed,
        }
    }
}

impl From<IdempotencyStage> for KeyStage {
    fn from(stage: IdempotencyStage) -> Self {
        match stage {
            IdempotencyStage::Pending => Self::Pending,
            IdempotencyStage::BalancesApplied => Self::BalancesApplied,
            IdempotencyStage::Committed => Self::Committed,
        }
    }
}
