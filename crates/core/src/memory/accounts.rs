use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tellr_shared::types::{AccountId, Money, UserId};

use crate::account::{Account, AccountStatus, AccountStore, AdjustError, NewAccount, StatusError};
use crate::error::StoreError;

/// Accounts held in a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<AccountId, Account>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every balance in the store.
    #[must_use]
    pub fn total_balance(&self) -> Money {
        self.accounts.iter().map(|account| account.balance).sum()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(&id).map(|account| account.clone()))
    }

    async fn adjust_balance(&self, id: AccountId, delta: Money) -> Result<Account, AdjustError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AdjustError::NotFound(id))?;
        if !account.is_active() {
            return Err(AdjustError::Inactive(id));
        }
        let next = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Corrupt(format!("balance overflow on {id}")))?;
        if next.is_negative() {
            return Err(AdjustError::InsufficientFunds {
                account_id: id,
                balance: account.balance,
                requested: -delta,
            });
        }
        account.balance = next;
        Ok(account.clone())
    }

    async fn refund(&self, id: AccountId, amount: Money) -> Result<Account, AdjustError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AdjustError::NotFound(id))?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Corrupt(format!("balance overflow on {id}")))?;
        if account.status == AccountStatus::Closed {
            account.status = AccountStatus::Active;
        }
        Ok(account.clone())
    }

    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        let mut owned: Vec<Account> = self
            .accounts
            .iter()
            .filter(|account| account.owner_id == owner)
            .map(|account| account.clone())
            .collect();
        owned.sort_by_key(|account| (account.created_at, account.id));
        Ok(owned)
    }

    async fn open(&self, account: NewAccount) -> Result<Account, StoreError> {
        let account = Account {
            id: AccountId::new(),
            owner_id: account.owner_id,
            account_type: account.account_type,
            balance: account.initial_deposit,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<Account, StatusError> {
        let mut account = self.accounts.get_mut(&id).ok_or(StatusError::NotFound(id))?;
        if account.status == AccountStatus::Closed {
            return Err(StatusError::AlreadyClosed(id));
        }
        if status == AccountStatus::Closed && !account.balance.is_zero() {
            return Err(StatusError::NonZeroBalance {
                account_id: id,
                balance: account.balance,
            });
        }
        account.status = status;
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn funded(store: &MemoryAccountStore, amount: Money) -> Account {
        store
            .open(NewAccount {
                owner_id: UserId::new(),
                account_type: AccountType::Checking,
                initial_deposit: amount,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_adjust_balance_credit_and_debit() {
        let store = MemoryAccountStore::new();
        let account = funded(&store, Money::new(dec!(100)).unwrap()).await;

        let after = store
            .adjust_balance(account.id, Money::new(dec!(-40)).unwrap())
            .await
            .unwrap();
        assert_eq!(after.balance, Money::new(dec!(60)).unwrap());

        let after = store
            .adjust_balance(account.id, Money::new(dec!(15.5)).unwrap())
            .await
            .unwrap();
        assert_eq!(after.balance, Money::new(dec!(75.5)).unwrap());
    }

    #[tokio::test]
    async fn test_overdraft_leaves_balance_unchanged() {
        let store = MemoryAccountStore::new();
        let account = funded(&store, Money::new(dec!(100)).unwrap()).await;

        let err = store
            .adjust_balance(account.id, Money::new(dec!(-100.01)).unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdjustError::InsufficientFunds {
                account_id: account.id,
                balance: Money::new(dec!(100)).unwrap(),
                requested: Money::new(dec!(100.01)).unwrap(),
            }
        );
        let current = store.get(account.id).await.unwrap().unwrap();
        assert_eq!(current.balance, Money::new(dec!(100)).unwrap());
    }

    #[tokio::test]
    async fn test_adjust_unknown_account() {
        let store = MemoryAccountStore::new();
        let id = AccountId::new();
        assert_eq!(
            store.adjust_balance(id, Money::ZERO).await.unwrap_err(),
            AdjustError::NotFound(id)
        );
    }

    #[tokio::test]
    async fn test_refund_reopens_closed_account() {
        let store = MemoryAccountStore::new();
        let account = funded(&store, Money::ZERO).await;
        store.set_status(account.id, AccountStatus::Closed).await.unwrap();

        let refunded = store
            .refund(account.id, Money::new(dec!(25)).unwrap())
            .await
            .unwrap();
        assert_eq!(refunded.balance, Money::new(dec!(25)).unwrap());
        assert_eq!(refunded.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_frozen_account_can_be_reactivated() {
        let store = MemoryAccountStore::new();
        let account = funded(&store, Money::new(dec!(5)).unwrap()).await;
        store.set_status(account.id, AccountStatus::Inactive).await.unwrap();
        assert_eq!(
            store
                .adjust_balance(account.id, Money::new(dec!(-1)).unwrap())
                .await
                .unwrap_err(),
            AdjustError::Inactive(account.id)
        );

        let active = store.set_status(account.id, AccountStatus::Active).await.unwrap();
        assert_eq!(active.balance, Money::new(dec!(5)).unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_overdraw() {
        let store = Arc::new(MemoryAccountStore::new());
        let account = funded(&store, Money::new(dec!(1000)).unwrap()).await;

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .adjust_balance(account.id, Money::new(dec!(-30)).unwrap())
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        // 1000 / 30 = 33 debits fit.
        assert_eq!(succeeded, 33);
        let current = store.get(account.id).await.unwrap().unwrap();
        assert_eq!(current.balance, Money::new(dec!(10)).unwrap());
    }
}
