//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tellr_core::account::{Account, AccountStatus, AccountType};
use tellr_shared::types::{AccountId, Money, UserId};

/// Stored account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountKind {
    /// Savings account.
    #[sea_orm(string_value = "savings")]
    Savings,
    /// Checking account.
    #[sea_orm(string_value = "checking")]
    Checking,
}

/// Stored lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountState {
    /// Open.
    #[sea_orm(string_value = "active")]
    Active,
    /// Frozen.
    #[sea_orm(string_value = "inactive")]
    Inactive,
    /// Closed.
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub account_type: AccountKind,
    /// Balance in cents.
    pub balance_minor: i64,
    pub status: AccountState,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain type.
    #[must_use]
    pub fn into_domain(self) -> Account {
        Account {
            id: AccountId::from_uuid(self.id),
            owner_id: UserId::from_uuid(self.owner_id),
            account_type: self.account_type.into(),
            balance: Money::from_minor_units(self.balance_minor),
            status: self.status.into(),
            created_at: self.created_at,
        }
    }
}

impl From<AccountKind> for AccountType {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Savings => Self::Savings,
            AccountKind::Checking => Self::Checking,
        }
    }
}

impl From<AccountType> for AccountKind {
    fn from(kind: AccountType) -> Self {
        match kind {
            AccountType::Savings => Self::Savings,
            AccountType::Checking => Self::Checking,
        }
    }
}

impl From<AccountState> for AccountStatus {
    fn from(state: AccountState) -> Self {
        match state {
            AccountState::Active => Self::Active,
            AccountState::Inactive => Self::Inactive,
            AccountState::Closed => Self::Closed,
        }
    }
}

impl From<AccountStatus> for AccountState {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => Self::Active,
            AccountStatus::Inactive => Self::Inactive,
            AccountStatus::Closed => Self::Closed,
        }
    }
}
