//! Account lifecycle rules on top of an [`AccountStore`].

use std::sync::Arc;

use tellr_shared::types::{AccountId, Money, UserId};
use thiserror::Error;

use super::store::{AccountStore, StatusError};
use super::types::{Account, AccountStatus, AccountType, NewAccount};
use crate::error::StoreError;

/// Errors from account lifecycle operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// No such account, or it belongs to someone else.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Opening balance must not be negative.
    #[error("Initial deposit cannot be negative: {0}")]
    NegativeInitialDeposit(Money),

    /// Only empty accounts can be closed.
    #[error("Account {account_id} still holds {balance}")]
    NonZeroBalance {
        /// The account.
        account_id: AccountId,
        /// Its current balance.
        balance: Money,
    },

    /// The account is already closed.
    #[error("Account {0} is already closed")]
    AlreadyClosed(AccountId),

    /// Backend failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::NegativeInitialDeposit(_) => "INVALID_AMOUNT",
            Self::NonZeroBalance { .. } => "NON_ZERO_BALANCE",
            Self::AlreadyClosed(_) => "ACCOUNT_CLOSED",
            Self::Storage(_) => "STORAGE_UNAVAILABLE",
        }
    }
}

impl From<StatusError> for AccountError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(id) => Self::NotFound(id),
            StatusError::AlreadyClosed(id) => Self::AlreadyClosed(id),
            StatusError::NonZeroBalance {
                account_id,
                balance,
            } => Self::NonZeroBalance {
                account_id,
                balance,
            },
            StatusError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Opens, lists and closes accounts on behalf of their owner.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    /// Creates a new service.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Opens an active account for `owner`.
    pub async fn open(
        &self,
        owner: UserId,
        account_type: AccountType,
        initial_deposit: Money,
    ) -> Result<Account, AccountError> {
        if initial_deposit.is_negative() {
            return Err(AccountError::NegativeInitialDeposit(initial_deposit));
        }
        let account = self
            .store
            .open(NewAccount {
                owner_id: owner,
                account_type,
                initial_deposit,
            })
            .await?;
        tracing::info!(
            account_id = %account.id,
            owner_id = %owner,
            account_type = %account_type,
            "Account opened"
        );
        Ok(account)
    }

    /// Lists the owner's accounts.
    pub async fn list(&self, owner: UserId) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.accounts_for_owner(owner).await?)
    }

    /// Loads an account, hiding accounts owned by someone else.
    pub async fn get_owned(&self, owner: UserId, id: AccountId) -> Result<Account, AccountError> {
        match self.store.get(id).await? {
            Some(account) if account.owner_id == owner => Ok(account),
            _ => Err(AccountError::NotFound(id)),
        }
    }

    /// Closes an empty account.
    ///
    /// The zero-balance check happens inside the store together with the status
    /// change, so a credit racing the close either lands first and blocks it or
    /// is refused afterwards.
    pub async fn close(&self, owner: UserId, id: AccountId) -> Result<Account, AccountError> {
        self.get_owned(owner, id).await?;
        let closed = self.store.set_status(id, AccountStatus::Closed).await?;
        tracing::info!(account_id = %id, "Account closed");
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryAccountStore;
    use rust_decimal_macros::dec;

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount).unwrap()
    }

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryAccountStore::new()))
    }

    #[tokio::test]
    async fn test_open_and_list() {
        let service = service();
        let owner = UserId::new();
        let savings = service
            .open(owner, AccountType::Savings, money(dec!(500)))
            .await
            .unwrap();
        service
            .open(owner, AccountType::Checking, Money::ZERO)
            .await
            .unwrap();
        service
            .open(UserId::new(), AccountType::Checking, Money::ZERO)
            .await
            .unwrap();

        let accounts = service.list(owner).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, savings.id);
        assert_eq!(accounts[0].balance, money(dec!(500)));
        assert!(accounts.iter().all(Account::is_active));
    }

    #[tokio::test]
    async fn test_open_rejects_negative_deposit() {
        let result = service()
            .open(UserId::new(), AccountType::Savings, money(dec!(-1)))
            .await;
        assert!(matches!(result, Err(AccountError::NegativeInitialDeposit(_))));
    }

    #[tokio::test]
    async fn test_get_owned_hides_foreign_accounts() {
        let service = service();
        let owner = UserId::new();
        let account = service
            .open(owner, AccountType::Savings, Money::ZERO)
            .await
            .unwrap();

        assert!(service.get_owned(owner, account.id).await.is_ok());
        assert!(matches!(
            service.get_owned(UserId::new(), account.id).await,
            Err(AccountError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_requires_zero_balance() {
        let service = service();
        let owner = UserId::new();
        let funded = service
            .open(owner, AccountType::Savings, money(dec!(10)))
            .await
            .unwrap();
        let empty = service
            .open(owner, AccountType::Checking, Money::ZERO)
            .await
            .unwrap();

        assert!(matches!(
            service.close(owner, funded.id).await,
            Err(AccountError::NonZeroBalance { .. })
        ));

        let closed = service.close(owner, empty.id).await.unwrap();
        assert_eq!(closed.status, AccountStatus::Closed);
        assert!(matches!(
            service.close(owner, empty.id).await,
            Err(AccountError::AlreadyClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_account_refuses_credits() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = AccountService::new(store.clone());
        let owner = UserId::new();
        let account = service
            .open(owner, AccountType::Checking, Money::ZERO)
            .await
            .unwrap();
        service.close(owner, account.id).await.unwrap();

        let err = store
            .adjust_balance(account.id, money(dec!(200)))
            .await
            .unwrap_err();
        assert_eq!(err, crate::account::AdjustError::Inactive(account.id));
        assert_eq!(
            service.get_owned(owner, account.id).await.unwrap().balance,
            Money::ZERO
        );
    }

    #[tokio::test]
    async fn test_close_after_credit_is_refused() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = AccountService::new(store.clone());
        let owner = UserId::new();
        let account = service
            .open(owner, AccountType::Checking, Money::ZERO)
            .await
            .unwrap();
        store
            .adjust_balance(account.id, money(dec!(200)))
            .await
            .unwrap();

        assert!(matches!(
            service.close(owner, account.id).await,
            Err(AccountError::NonZeroBalance { balance, .. }) if balance == money(dec!(200))
        ));
        assert!(service.get_owned(owner, account.id).await.unwrap().is_active());
    }
}
