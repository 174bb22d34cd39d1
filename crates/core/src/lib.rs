//! Core ledger logic for Tellr.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the traits in [`account`], [`ledger`] and
//! [`transfer::idempotency`]; the `tellr-db` crate implements them for SQL and
//! [`memory`] implements them in process.
//!
//! # Modules
//!
//! - `account` - Account records, the balance-adjustment primitive, account lifecycle
//! - `ledger` - Append-only entries and ordered history queries
//! - `transfer` - The deposit/transfer state machine with compensation and idempotency
//! - `statement` - Monthly income/expense statements
//! - `memory` - In-process store implementations

pub mod account;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod statement;
pub mod transfer;

pub use error::StoreError;
