//! Shared setup for repository tests: a migrated in-memory SQLite database.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tellr_core::account::{Account, AccountStore, AccountType, NewAccount};
use tellr_db::migration::Migrator;
use tellr_db::{AccountRepository, connect};
use tellr_shared::config::DatabaseConfig;
use tellr_shared::types::{Money, UserId};

pub fn money(amount: Decimal) -> Money {
    Money::new(amount).unwrap()
}

pub async fn setup_db() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        run_migrations: true,
    };
    let db = connect(&config).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn open_account(
    accounts: &AccountRepository,
    owner: UserId,
    account_type: AccountType,
    opening: Decimal,
) -> Account {
    accounts
        .open(NewAccount {
            owner_id: owner,
            account_type,
            initial_deposit: money(opening),
        })
        .await
        .expect("open account")
}
