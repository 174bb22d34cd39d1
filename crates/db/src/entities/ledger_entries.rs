//! `SeaORM` Entity for ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tellr_core::ledger::{EntryKind, LedgerEntry};
use tellr_shared::types::{AccountId, CorrelationId, EntryId, Money};

/// Stored entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryDirection {
    /// Deposit.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Outgoing transfer leg.
    #[sea_orm(string_value = "transfer-out")]
    TransferOut,
    /// Incoming transfer leg.
    #[sea_orm(string_value = "transfer-in")]
    TransferIn,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub counterparty_id: Option<Uuid>,
    pub correlation_id: Uuid,
    pub kind: EntryDirection,
    /// Positive amount in cents.
    pub amount_minor: i64,
    pub category: String,
    pub occurred_at: Date,
    pub description: Option<String>,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain type.
    #[must_use]
    pub fn into_domain(self) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            counterparty_id: self.counterparty_id.map(AccountId::from_uuid),
            correlation_id: CorrelationId::from_uuid(self.correlation_id),
            kind: self.kind.into(),
            amount: Money::from_minor_units(self.amount_minor),
            category: self.category,
            occurred_at: self.occurred_at,
            description: self.description,
            recorded_at: self.recorded_at,
        }
    }
}

impl From<EntryDirection> for EntryKind {
    fn from(direction: EntryDirection) -> Self {
        match direction {
            EntryDirection::Deposit => Self::Deposit,
            EntryDirection::TransferOut => Self::TransferOut,
            EntryDirection::TransferIn => Self::TransferIn,
        }
    }
}

impl From<EntryKind> for EntryDirection {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Deposit => Self::Deposit,
            EntryKind::TransferOut => Self::TransferOut,
            EntryKind::TransferIn => Self::TransferIn,
        }
    }
}
