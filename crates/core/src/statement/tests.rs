use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tellr_shared::types::{AccountId, Money, UserId};

use super::*;
use crate::account::{AccountStore, AccountType, NewAccount};
use crate::ledger::HistoryService;
use crate::memory::{MemoryAccountStore, MemoryIdempotencyStore, MemoryLedger};
use crate::transfer::{TransferEngine, TransferKind, TransferRequest};

struct Bank {
    accounts: Arc<MemoryAccountStore>,
    engine: TransferEngine,
    statements: StatementBuilder,
}

impl Bank {
    fn new() -> Self {
        let accounts = Arc::new(MemoryAccountStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let engine = TransferEngine::new(
            accounts.clone(),
            ledger.clone(),
            Arc::new(MemoryIdempotencyStore::new()),
        );
        let history = HistoryService::new(ledger, accounts.clone()).with_page_size(2);
        Self {
            accounts,
            engine,
            statements: StatementBuilder::new(history),
        }
    }

    async fn open(&self, owner: UserId, amount: Decimal) -> AccountId {
        self.accounts
            .open(NewAccount {
                owner_id: owner,
                account_type: AccountType::Savings,
                initial_deposit: money(amount),
            })
            .await
            .unwrap()
            .id
    }

    async fn deposit(&self, owner: UserId, account: AccountId, amount: Decimal, on: NaiveDate) {
        self.engine
            .execute(TransferRequest {
                initiated_by: owner,
                account_id: account,
                recipient_id: None,
                kind: TransferKind::Deposit,
                amount: money(amount),
                occurred_at: on,
                category: "salary".to_string(),
                description: None,
                idempotency_key: None,
            })
            .await
            .unwrap();
    }

    async fn transfer(
        &self,
        owner: UserId,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        on: NaiveDate,
    ) {
        self.engine
            .execute(TransferRequest {
                initiated_by: owner,
                account_id: from,
                recipient_id: Some(to),
                kind: TransferKind::Transfer,
                amount: money(amount),
                occurred_at: on,
                category: "bills".to_string(),
                description: None,
                idempotency_key: None,
            })
            .await
            .unwrap();
    }

    async fn total(&self, owner: UserId) -> Money {
        self.accounts
            .accounts_for_owner(owner)
            .await
            .unwrap()
            .iter()
            .map(|a| a.balance)
            .sum()
    }
}

fn money(amount: Decimal) -> Money {
    Money::new(amount).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_deposit_shows_as_income() {
    let bank = Bank::new();
    let owner = UserId::new();
    let account = bank.open(owner, dec!(300)).await;
    bank.deposit(owner, account, dec!(150), date(2024, 3, 5)).await;

    let statement = bank.statements.monthly_statement(owner, 3, 2024).await.unwrap();
    assert!(statement.total_income >= money(dec!(150)));
    assert_eq!(statement.total_expense, Money::ZERO);
    assert_eq!(statement.period_start, date(2024, 3, 1));
    assert_eq!(statement.period_end, date(2024, 4, 1));
    assert_eq!(statement.entries.len(), 1);
}

#[tokio::test]
async fn test_only_entries_inside_the_month_count() {
    let bank = Bank::new();
    let owner = UserId::new();
    let account = bank.open(owner, dec!(0)).await;
    bank.deposit(owner, account, dec!(10), date(2024, 2, 29)).await;
    bank.deposit(owner, account, dec!(20), date(2024, 3, 1)).await;
    bank.deposit(owner, account, dec!(30), date(2024, 3, 31)).await;
    bank.deposit(owner, account, dec!(40), date(2024, 4, 1)).await;

    let statement = bank.statements.monthly_statement(owner, 3, 2024).await.unwrap();
    assert_eq!(statement.total_income, money(dec!(50)));
    assert_eq!(
        statement
            .entries
            .iter()
            .map(|e| e.occurred_at)
            .collect::<Vec<_>>(),
        vec![date(2024, 3, 1), date(2024, 3, 31)]
    );
}

#[tokio::test]
async fn test_net_change_matches_balance_change() {
    let bank = Bank::new();
    let owner = UserId::new();
    let stranger = UserId::new();
    let checking = bank.open(owner, dec!(1000)).await;
    let savings = bank.open(owner, dec!(200)).await;
    let landlord = bank.open(stranger, dec!(0)).await;
    let before = bank.total(owner).await;

    bank.deposit(owner, checking, dec!(2500), date(2024, 3, 1)).await;
    bank.transfer(owner, checking, savings, dec!(400), date(2024, 3, 2)).await;
    bank.transfer(owner, checking, landlord, dec!(1200), date(2024, 3, 3)).await;
    bank.transfer(stranger, landlord, savings, dec!(75.25), date(2024, 3, 20)).await;

    let statement = bank.statements.monthly_statement(owner, 3, 2024).await.unwrap();
    let after = bank.total(owner).await;

    // Internal transfer shows on both sides.
    assert_eq!(statement.total_income, money(dec!(2975.25)));
    assert_eq!(statement.total_expense, money(dec!(1600)));
    assert_eq!(statement.net_change, after - before);
    assert!(statement.entries.windows(2).all(|w| w[0].cursor() < w[1].cursor()));
}

#[tokio::test]
async fn test_no_accounts() {
    let bank = Bank::new();
    let err = bank
        .statements
        .monthly_statement(UserId::new(), 3, 2024)
        .await
        .unwrap_err();
    assert!(matches!(err, StatementError::NoAccounts(_)));
}

#[tokio::test]
async fn test_empty_month_is_zero() {
    let bank = Bank::new();
    let owner = UserId::new();
    bank.open(owner, dec!(10)).await;

    let statement = bank.statements.monthly_statement(owner, 7, 2024).await.unwrap();
    assert_eq!(statement.total_income, Money::ZERO);
    assert_eq!(statement.total_expense, Money::ZERO);
    assert!(statement.entries.is_empty());
}

#[tokio::test]
async fn test_invalid_period() {
    let bank = Bank::new();
    let owner = UserId::new();
    bank.open(owner, dec!(10)).await;

    let err = bank
        .statements
        .monthly_statement(owner, 13, 2024)
        .await
        .unwrap_err();
    assert!(matches!(err, StatementError::InvalidPeriod { month: 13, year: 2024 }));
    assert_eq!(err.error_code(), "INVALID_PERIOD");
}

#[tokio::test]
async fn test_totals_beyond_money_range_are_refused() {
    let bank = Bank::new();
    let owner = UserId::new();
    let first = bank.open(owner, dec!(0)).await;
    let second = bank.open(owner, dec!(0)).await;
    bank.deposit(owner, first, Money::MAX.amount(), date(2024, 5, 1)).await;
    bank.deposit(owner, second, Money::MAX.amount(), date(2024, 5, 2)).await;

    let err = bank
        .statements
        .monthly_statement(owner, 5, 2024)
        .await
        .unwrap_err();
    assert!(matches!(err, StatementError::TotalOverflow));
    assert_eq!(err.error_code(), "AMOUNT_OUT_OF_RANGE");
}
