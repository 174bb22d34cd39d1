//! Property-based tests for HistoryService.
//!
//! - Entries come back in ledger order, across page boundaries
//! - Exactly the matching entries come back
//! - Re-running a query after more appends returns a superset

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::TryStreamExt;
use proptest::prelude::*;
use tellr_shared::types::{AccountId, CorrelationId, EntryId, Money};

use super::history::HistoryService;
use super::store::Ledger;
use super::types::{DateRange, EntryKind, LedgerEntry, NewEntry};
use crate::memory::{MemoryAccountStore, MemoryLedger};

/// Strategy for a business date within 2024.
fn day_of_2024() -> impl Strategy<Value = NaiveDate> {
    (0u64..366).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(offset))
            .unwrap()
    })
}

/// Strategy for `(account index, date, batch)` tuples.
fn entry_specs() -> impl Strategy<Value = Vec<(usize, NaiveDate, bool)>> {
    prop::collection::vec((0usize..3, day_of_2024(), any::<bool>()), 0..40)
}

fn new_entry(account: AccountId, occurred_at: NaiveDate) -> NewEntry {
    NewEntry {
        account_id: account,
        counterparty_id: None,
        correlation_id: CorrelationId::new(),
        kind: EntryKind::Deposit,
        amount: Money::from_minor_units(100),
        category: "test".to_string(),
        occurred_at,
        description: None,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn seed(
    ledger: &MemoryLedger,
    accounts: &[AccountId],
    specs: &[(usize, NaiveDate, bool)],
) -> Vec<LedgerEntry> {
    let mut written = Vec::new();
    let mut pending = Vec::new();
    for &(index, date, flush) in specs {
        pending.push(new_entry(accounts[index], date));
        if flush {
            written.extend(ledger.append_all(std::mem::take(&mut pending)).await.unwrap());
        }
    }
    if !pending.is_empty() {
        written.extend(ledger.append_all(pending).await.unwrap());
    }
    written
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Results are sorted by (occurred_at, recorded_at, id) and contain exactly the matching entries.
    #[test]
    fn prop_query_is_ordered_and_complete(
        specs in entry_specs(),
        page_size in 1usize..5,
        range_start in day_of_2024(),
        span in 0u64..200,
    ) {
        runtime().block_on(async {
            let ledger = Arc::new(MemoryLedger::new());
            let accounts: Vec<AccountId> = (0..3).map(|_| AccountId::new()).collect();
            let written = seed(&ledger, &accounts, &specs).await;

            let end = range_start.checked_add_days(chrono::Days::new(span)).unwrap();
            let range = DateRange::new(Some(range_start), Some(end)).unwrap();
            let selected = [accounts[0], accounts[2]];

            let history = HistoryService::new(ledger, Arc::new(MemoryAccountStore::new()))
                .with_page_size(page_size);
            let result: Vec<LedgerEntry> =
                history.by_accounts(selected, range).try_collect().await.unwrap();

            prop_assert!(result.windows(2).all(|w| w[0].cursor() < w[1].cursor()));

            let expected: HashSet<EntryId> = written
                .iter()
                .filter(|e| selected.contains(&e.account_id) && range.contains(e.occurred_at))
                .map(|e| e.id)
                .collect();
            let actual: HashSet<EntryId> = result.iter().map(|e| e.id).collect();
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(result.len(), written
                .iter()
                .filter(|e| selected.contains(&e.account_id) && range.contains(e.occurred_at))
                .count());
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Re-querying after further appends never loses entries.
    #[test]
    fn prop_requery_is_monotonic(
        first in entry_specs(),
        second in entry_specs(),
    ) {
        runtime().block_on(async {
            let ledger = Arc::new(MemoryLedger::new());
            let accounts: Vec<AccountId> = (0..3).map(|_| AccountId::new()).collect();
            let history = HistoryService::new(ledger.clone(), Arc::new(MemoryAccountStore::new()))
                .with_page_size(2);

            seed(&ledger, &accounts, &first).await;
            let before: Vec<LedgerEntry> = history
                .by_accounts(accounts.clone(), DateRange::unbounded())
                .try_collect()
                .await
                .unwrap();

            seed(&ledger, &accounts, &second).await;
            let after: Vec<LedgerEntry> = history
                .by_accounts(accounts.clone(), DateRange::unbounded())
                .try_collect()
                .await
                .unwrap();

            prop_assert_eq!(after.len(), first.len() + second.len());
            let after_ids: HashSet<EntryId> = after.iter().map(|e| e.id).collect();
            prop_assert!(before.iter().all(|e| after_ids.contains(&e.id)));
            Ok::<(), TestCaseError>(())
        })?;
    }
}

#[tokio::test]
async fn test_empty_account_set_yields_nothing() {
    let ledger = Arc::new(MemoryLedger::new());
    let account = AccountId::new();
    ledger
        .append(new_entry(account, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
        .await
        .unwrap();

    let history = HistoryService::new(ledger, Arc::new(MemoryAccountStore::new()));
    let result: Vec<LedgerEntry> = history
        .by_accounts(Vec::new(), DateRange::unbounded())
        .try_collect()
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_by_user_resolves_owned_accounts() {
    use crate::account::{AccountStore, AccountType, NewAccount};
    use tellr_shared::types::UserId;

    let ledger = Arc::new(MemoryLedger::new());
    let accounts = Arc::new(MemoryAccountStore::new());
    let owner = UserId::new();
    let mine = accounts
        .open(NewAccount {
            owner_id: owner,
            account_type: AccountType::Savings,
            initial_deposit: Money::ZERO,
        })
        .await
        .unwrap();
    let foreign = AccountId::new();

    let march = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    ledger.append(new_entry(mine.id, march)).await.unwrap();
    ledger.append(new_entry(mine.id, april)).await.unwrap();
    ledger.append(new_entry(foreign, march)).await.unwrap();

    let history = HistoryService::new(ledger, accounts);
    let month = super::types::YearMonth::new(2024, 3).unwrap().range();
    let result: Vec<LedgerEntry> = history
        .by_user(owner, month)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].account_id, mine.id);
    assert_eq!(result[0].occurred_at, march);
}
