//! Account repository backed by the `accounts` table.
//!
//! Balances are stored as integer cents. Adjustments are a single conditional
//! `UPDATE ... SET balance_minor = balance_minor + delta WHERE status = 'active'
//! AND balance_minor >= -delta`, and closing is `UPDATE ... WHERE balance_minor = 0`,
//! so the database serializes every change of one row.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tellr_core::StoreError;
use tellr_core::account::{
    Account, AccountStatus, AccountStore, AdjustError, NewAccount, StatusError,
};
use tellr_shared::types::{AccountId, Money, MoneyError, UserId};
use tracing::debug;

use crate::entities::accounts::{self, AccountState};
use crate::error::store_error;

/// Account repository implementing [`AccountStore`].
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: AccountId) -> Result<Option<accounts::Model>, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)
    }
}

async fn reread(txn: &DatabaseTransaction, id: AccountId) -> Result<Option<accounts::Model>, StoreError> {
    accounts::Entity::find_by_id(id.into_inner())
        .one(txn)
        .await
        .map_err(store_error)
}

fn out_of_range(err: MoneyError) -> StoreError {
    StoreError::Corrupt(format!("amount cannot be stored: {err}"))
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.find(id).await?.map(accounts::Model::into_domain))
    }

    async fn adjust_balance(&self, id: AccountId, delta: Money) -> Result<Account, AdjustError> {
        let delta_minor = delta.to_minor_units().map_err(out_of_range)?;
        let floor = delta_minor
            .checked_neg()
            .ok_or_else(|| out_of_range(MoneyError::OutOfRange))?;

        let txn = self.db.begin().await.map_err(store_error)?;

        let mut update = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::BalanceMinor,
                Expr::col(accounts::Column::BalanceMinor).add(delta_minor),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::Status.eq(AccountState::Active));
        if delta_minor < 0 {
            update = update.filter(accounts::Column::BalanceMinor.gte(floor));
        }
        let result = update.exec(&txn).await.map_err(store_error)?;

        // Dropping `txn` on the early returns rolls back.
        let Some(row) = reread(&txn, id).await? else {
            return Err(AdjustError::NotFound(id));
        };

        if result.rows_affected == 0 && row.status != AccountState::Active {
            return Err(AdjustError::Inactive(id));
        }
        if result.rows_affected == 0 {
            debug!(account_id = %id, balance_minor = row.balance_minor, delta_minor, "Debit refused");
            return Err(AdjustError::InsufficientFunds {
                account_id: id,
                balance: Money::from_minor_units(row.balance_minor),
                requested: -delta,
            });
        }

        txn.commit().await.map_err(store_error)?;
        Ok(row.into_domain())
    }

    async fn refund(&self, id: AccountId, amount: Money) -> Result<Account, AdjustError> {
        let amount_minor = amount.to_minor_units().map_err(out_of_range)?;
        let txn = self.db.begin().await.map_err(store_error)?;

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::BalanceMinor,
                Expr::col(accounts::Column::BalanceMinor).add(amount_minor),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 0 {
            return Err(AdjustError::NotFound(id));
        }

        accounts::Entity::update_many()
            .col_expr(accounts::Column::Status, Expr::value(AccountState::Active))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::Status.eq(AccountState::Closed))
            .exec(&txn)
            .await
            .map_err(store_error)?;

        let row = reread(&txn, id).await?.ok_or(AdjustError::NotFound(id))?;
        txn.commit().await.map_err(store_error)?;
        Ok(row.into_domain())
    }

    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(accounts::Model::into_domain).collect())
    }

    async fn open(&self, account: NewAccount) -> Result<Account, StoreError> {
        let now = Utc::now().trunc_subsecs(6);
        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            owner_id: Set(account.owner_id.into_inner()),
            account_type: Set(account.account_type.into()),
            balance_minor: Set(account.initial_deposit.to_minor_units().map_err(out_of_range)?),
            status: Set(AccountState::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let row = model.insert(&self.db).await.map_err(store_error)?;
        Ok(row.into_domain())
    }

    async fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<Account, StatusError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let mut update = accounts::Entity::update_many()
            .col_expr(accounts::Column::Status, Expr::value(AccountState::from(status)))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::Status.ne(AccountState::Closed));
        if status == AccountStatus::Closed {
            update = update.filter(accounts::Column::BalanceMinor.eq(0));
        }
        let result = update.exec(&txn).await.map_err(store_error)?;

        let Some(row) = reread(&txn, id).await? else {
            return Err(StatusError::NotFound(id));
        };
        if result.rows_affected == 0 {
            return Err(if row.status == AccountState::Closed {
                StatusError::AlreadyClosed(id)
            } else {
                StatusError::NonZeroBalance {
                    account_id: id,
                    balance: Money::from_minor_units(row.balance_minor),
                }
            });
        }

        txn.commit().await.map_err(store_error)?;
        Ok(row.into_domain())
    }
}
