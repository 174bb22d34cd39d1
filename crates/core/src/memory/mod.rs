//! In-process store implementations.
//!
//! Used by tests and by embedders that do not need durability. Balance
//! adjustments lock a single map entry, so they are atomic per account.

mod accounts;
mod idempotency;
mod ledger;

pub use accounts::MemoryAccountStore;
pub use idempotency::MemoryIdempotencyStore;
pub use ledger::MemoryLedger;
