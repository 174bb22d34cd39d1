//! Account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tellr_shared::types::{AccountId, Money, UserId};

/// Kind of deposit account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Savings account.
    Savings,
    /// Checking account.
    Checking,
}

impl AccountType {
    /// Returns the storage/wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Checking => "checking",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "savings" => Ok(Self::Savings),
            "checking" => Ok(Self::Checking),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Lifecycle state. Accounts are never deleted, only closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Open for deposits and transfers.
    Active,
    /// Temporarily frozen.
    Inactive,
    /// Permanently closed.
    Closed,
}

impl AccountStatus {
    /// Returns the storage/wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Unknown account status: {s}")),
        }
    }
}

/// A customer account as currently stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning customer.
    pub owner_id: UserId,
    /// Savings or checking.
    pub account_type: AccountType,
    /// Current balance, never negative.
    pub balance: Money,
    /// Lifecycle state.
    pub status: AccountStatus,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if the account may take part in money movement.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Input for opening an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Owning customer.
    pub owner_id: UserId,
    /// Savings or checking.
    pub account_type: AccountType,
    /// Opening balance.
    pub initial_deposit: Money,
}
