//! Monthly account statements.
//!
//! Income is every `deposit` and `transfer-in` entry dated inside the month;
//! expense is every `transfer-out` entry. Both are sums of positive amounts.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use service::{StatementBuilder, StatementError};
pub use types::MonthlyStatement;
