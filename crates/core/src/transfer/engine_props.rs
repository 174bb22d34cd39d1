//! Property-based tests for TransferEngine.
//!
//! - Transfers conserve the total balance
//! - Every balance equals its opening amount plus its ledger history
//! - Refused transfers leave no trace

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use tellr_shared::types::{AccountId, Money, UserId};

use super::engine::TransferEngine;
use super::retry::RetryPolicy;
use super::types::{TransferKind, TransferRequest};
use crate::account::{AccountStore, AccountType, NewAccount};
use crate::ledger::{DateRange, EntryQuery, Ledger};
use crate::memory::{MemoryAccountStore, MemoryIdempotencyStore, MemoryLedger};

/// Strategy for opening balances (0.00 to 1,000.00).
fn opening_balance() -> impl Strategy<Value = i64> {
    0i64..100_000
}

/// Strategy for `(from, to, cents)` transfer attempts among three accounts.
fn attempts() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..3, 0usize..3, -100i64..60_000), 1..25)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_transfers_conserve_money(
        openings in prop::array::uniform3(opening_balance()),
        attempts in attempts(),
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let accounts = Arc::new(MemoryAccountStore::new());
            let ledger = Arc::new(MemoryLedger::new());
            let engine = TransferEngine::new(
                accounts.clone(),
                ledger.clone(),
                Arc::new(MemoryIdempotencyStore::new()),
            )
            .with_retry(RetryPolicy::none());

            let owner = UserId::new();
            let mut ids: Vec<AccountId> = Vec::new();
            for cents in openings {
                let account = accounts
                    .open(NewAccount {
                        owner_id: owner,
                        account_type: AccountType::Savings,
                        initial_deposit: Money::from_minor_units(cents),
                    })
                    .await
                    .unwrap();
                ids.push(account.id);
            }
            let total_before = accounts.total_balance();

            let mut committed = 0usize;
            for (from, to, cents) in attempts {
                let request = TransferRequest {
                    initiated_by: owner,
                    account_id: ids[from],
                    recipient_id: Some(ids[to]),
                    kind: TransferKind::Transfer,
                    amount: Money::from_minor_units(cents),
                    occurred_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    category: "move".to_string(),
                    description: None,
                    idempotency_key: None,
                };
                match engine.execute(request).await {
                    Ok(_) => committed += 1,
                    Err(e) => prop_assert!(e.is_rejection(), "unexpected failure: {e}"),
                }
            }

            prop_assert_eq!(accounts.total_balance(), total_before);

            let history = ledger
                .page(&EntryQuery::new(ids.clone(), DateRange::unbounded()), None, usize::MAX)
                .await
                .unwrap();
            prop_assert_eq!(history.len(), committed * 2);

            for (index, id) in ids.iter().enumerate() {
                let moved: Money = history
                    .iter()
                    .filter(|e| e.account_id == *id)
                    .map(crate::ledger::LedgerEntry::signed_amount)
                    .sum();
                let balance = accounts.get(*id).await.unwrap().unwrap().balance;
                prop_assert!(!balance.is_negative());
                prop_assert_eq!(balance, Money::from_minor_units(openings[index]) + moved);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
