//! Append-only ledger of money movements.
//!
//! This module implements:
//! - Immutable ledger entries and their total order
//! - Date ranges and calendar months used to slice history
//! - The `Ledger` storage seam with atomic batch append and keyset paging
//! - `HistoryService`, which streams ordered entries by account set or by user

pub mod history;
pub mod store;
pub mod types;

#[cfg(test)]
mod history_props;

pub use history::{EntryStream, HistoryService};
pub use store::Ledger;
pub use types::{
    DateRange, EntryCursor, EntryKind, EntryQuery, LedgerEntry, NewEntry, YearMonth,
};
