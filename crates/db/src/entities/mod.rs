//! `SeaORM` entity definitions.

pub mod accounts;
pub mod idempotency_keys;
pub mod ledger_entries;
