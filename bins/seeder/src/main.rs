//! Demo data seeder for Tellr development and testing.
//!
//! Opens a checking and a savings account for a fixed demo user, records a
//! salary deposit and a transfer, and prints a bearer token for that user.
//! Running it again reuses the existing accounts.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;
use sea_orm_migration::MigratorTrait;
use tellr_core::account::{Account, AccountService, AccountType};
use tellr_core::transfer::{TransferEngine, TransferKind, TransferRequest};
use tellr_db::migration::Migrator;
use tellr_db::{AccountRepository, IdempotencyRepository, LedgerRepository, connect};
use tellr_shared::types::{AccountId, Money, UserId};
use tellr_shared::{AppConfig, JwtService};
use uuid::Uuid;

/// Demo user ID (consistent for all seeds).
const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let user = UserId::from_uuid(DEMO_USER_ID);

    println!("Connecting to database...");
    let db = connect(&config.database).await?;
    Migrator::up(&db, None).await?;

    let store = Arc::new(AccountRepository::new(db.clone()));
    let accounts = AccountService::new(store.clone());
    let engine = TransferEngine::new(
        store,
        Arc::new(LedgerRepository::new(db.clone())),
        Arc::new(IdempotencyRepository::new(db)),
    );

    println!("Seeding demo accounts...");
    let existing = accounts.list(user).await?;
    let (checking, savings) = match existing.as_slice() {
        [first, second, ..] => (first.id, second.id),
        _ => seed_accounts(&accounts, user).await?,
    };

    println!("Seeding demo transactions...");
    let today = Utc::now().date_naive();
    let month_key = format!("{}-{:02}", today.year(), today.month());
    let movements = [
        TransferRequest {
            initiated_by: user,
            account_id: checking,
            recipient_id: None,
            kind: TransferKind::Deposit,
            amount: Money::new(dec!(2500.00))?,
            occurred_at: today,
            category: "salary".to_string(),
            description: Some("Demo payroll".to_string()),
            idempotency_key: Some(format!("seed-salary-{month_key}")),
        },
        TransferRequest {
            initiated_by: user,
            account_id: checking,
            recipient_id: Some(savings),
            kind: TransferKind::Transfer,
            amount: Money::new(dec!(400.00))?,
            occurred_at: today,
            category: "savings".to_string(),
            description: Some("Monthly savings".to_string()),
            idempotency_key: Some(format!("seed-savings-{month_key}")),
        },
    ];
    for movement in movements {
        let receipt = engine.execute(movement).await?;
        println!(
            "  {} {} -> balance {}",
            receipt.kind, receipt.correlation_id, receipt.balance
        );
    }

    let token = JwtService::new(&config.jwt).generate_access_token(user)?;
    println!("Seeding complete!");
    println!("Demo user: {user}");
    println!("Checking:  {checking}");
    println!("Savings:   {savings}");
    println!("Bearer token: {token}");

    Ok(())
}

async fn seed_accounts(
    accounts: &AccountService,
    user: UserId,
) -> anyhow::Result<(AccountId, AccountId)> {
    let checking: Account = accounts
        .open(user, AccountType::Checking, Money::new(dec!(500.00))?)
        .await?;
    let savings: Account = accounts
        .open(user, AccountType::Savings, Money::new(dec!(1000.00))?)
        .await?;
    Ok((checking.id, savings.id))
}
