//! Customer bank accounts.
//!
//! - Account records and their lifecycle states
//! - The `AccountStore` seam, whose `adjust_balance` is the only way a balance moves
//! - `AccountService` for opening, listing and closing accounts

pub mod service;
pub mod store;
pub mod types;

pub use service::{AccountError, AccountService};
pub use store::{AccountStore, AdjustError, StatusError};
pub use types::{Account, AccountStatus, AccountType, NewAccount};
