//! Storage seam for accounts.

use async_trait::async_trait;
use tellr_shared::types::{AccountId, Money, UserId};
use thiserror::Error;

use super::types::{Account, AccountStatus, NewAccount};
use crate::error::StoreError;

/// Errors from [`AccountStore::adjust_balance`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustError {
    /// No account with this ID.
    #[error("account {0} not found")]
    NotFound(AccountId),

    /// The debit would take the balance below zero. The balance is unchanged.
    #[error("insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The account that was debited.
        account_id: AccountId,
        /// Balance at the time of the attempt.
        balance: Money,
        /// Amount requested (positive).
        requested: Money,
    },

    /// The account is not active and does not move money.
    #[error("account {0} is not active")]
    Inactive(AccountId),

    /// Backend failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AdjustError {
    /// Flattens into a plain storage error, for callers that only credit.
    #[must_use]
    pub fn into_store_error(self) -> StoreError {
        match self {
            Self::NotFound(_) | Self::Inactive(_) => StoreError::NotFound,
            Self::InsufficientFunds { account_id, .. } => {
                StoreError::Corrupt(format!("credit to {account_id} reported insufficient funds"))
            }
            Self::Storage(e) => e,
        }
    }

    /// Returns true if repeating the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_transient())
    }
}

/// Errors from [`AccountStore::set_status`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// No account with this ID.
    #[error("account {0} not found")]
    NotFound(AccountId),

    /// Closed is final.
    #[error("account {0} is already closed")]
    AlreadyClosed(AccountId),

    /// Only an empty account can be closed.
    #[error("account {account_id} still holds {balance}")]
    NonZeroBalance {
        /// The account.
        account_id: AccountId,
        /// Balance at the time of the attempt.
        balance: Money,
    },

    /// Backend failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Owns account records and current balances.
///
/// Implementations must make `adjust_balance` atomic per account: two concurrent
/// debits can never both succeed when only one fits in the balance.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Loads one account.
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Atomically applies `balance += delta` to exactly one account.
    ///
    /// A negative `delta` that would leave the balance below zero fails with
    /// [`AdjustError::InsufficientFunds`] and changes nothing. Accounts that are
    /// not active refuse every adjustment with [`AdjustError::Inactive`].
    async fn adjust_balance(&self, id: AccountId, delta: Money) -> Result<Account, AdjustError>;

    /// Gives back `amount` taken by an earlier debit whose movement failed.
    ///
    /// Applies whatever the status; an account closed since the debit is reopened,
    /// so a closed account never holds money.
    async fn refund(&self, id: AccountId, amount: Money) -> Result<Account, AdjustError>;

    /// Lists a customer's accounts, oldest first.
    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError>;

    /// Opens an account with the given opening balance.
    async fn open(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Changes the lifecycle state. Balances are untouched.
    ///
    /// Closing is conditional on a zero balance, checked in the same atomic step
    /// as the change, so no adjustment can land between the check and the close.
    async fn set_status(&self, id: AccountId, status: AccountStatus)
    -> Result<Account, StatusError>;
}
