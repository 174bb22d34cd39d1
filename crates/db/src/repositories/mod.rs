//! Store implementations backed by `SeaORM`.
//!
//! Each repository implements one storage trait from `tellr-core`, so the
//! transfer engine runs unchanged against the database or the in-memory stores.

pub mod account;
pub mod idempotency;
pub mod ledger;

pub use account::AccountRepository;
pub use idempotency::IdempotencyRepository;
pub use ledger::LedgerRepository;
