//! Statement aggregation over the ledger.

use futures::TryStreamExt;
use tellr_shared::types::{Money, UserId};
use thiserror::Error;

use super::types::MonthlyStatement;
use crate::error::StoreError;
use crate::ledger::{HistoryService, LedgerEntry, YearMonth};

/// Errors that can occur while building a statement.
#[derive(Debug, Error)]
pub enum StatementError {
    /// The customer owns no accounts.
    #[error("User {0} has no accounts")]
    NoAccounts(UserId),

    /// Month outside 1..=12 or year out of range.
    #[error("Invalid statement period {year}-{month}")]
    InvalidPeriod {
        /// Requested month.
        month: u32,
        /// Requested year.
        year: i32,
    },

    /// A total does not fit into the money range.
    #[error("Statement totals overflow the money range")]
    TotalOverflow,

    /// Backend failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl StatementError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoAccounts(_) => "NO_ACCOUNTS",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::TotalOverflow => "AMOUNT_OUT_OF_RANGE",
            Self::Storage(_) => "STORAGE_UNAVAILABLE",
        }
    }
}

/// Builds monthly statements from ledger history.
#[derive(Clone)]
pub struct StatementBuilder {
    history: HistoryService,
}

impl StatementBuilder {
    /// Creates a new builder.
    #[must_use]
    pub const fn new(history: HistoryService) -> Self {
        Self { history }
    }

    /// Totals a customer's income and expense for one calendar month.
    pub async fn monthly_statement(
        &self,
        user: UserId,
        month: u32,
        year: i32,
    ) -> Result<MonthlyStatement, StatementError> {
        let period = YearMonth::new(year, month).ok_or(StatementError::InvalidPeriod { month, year })?;
        let range = period.range();
        let (Some(period_start), Some(period_end)) = (range.start, range.end) else {
            return Err(StatementError::InvalidPeriod { month, year });
        };

        let accounts = self.history.user_accounts(user).await?;
        if accounts.is_empty() {
            return Err(StatementError::NoAccounts(user));
        }

        let entries: Vec<LedgerEntry> = self.history.by_accounts(accounts, range).try_collect().await?;

        let (total_income, total_expense) = totals(&entries)?;
        let net_change = total_income
            .checked_sub(total_expense)
            .ok_or(StatementError::TotalOverflow)?;

        tracing::debug!(
            user_id = %user,
            period = %period,
            entries = entries.len(),
            %total_income,
            %total_expense,
            "Statement built"
        );

        Ok(MonthlyStatement {
            user_id: user,
            period,
            period_start,
            period_end,
            total_income,
            total_expense,
            net_change,
            entries,
        })
    }
}

/// Sums income and expense, refusing to leave the money range.
fn totals(entries: &[LedgerEntry]) -> Result<(Money, Money), StatementError> {
    entries
        .iter()
        .try_fold((Money::ZERO, Money::ZERO), |(income, expense), entry| {
            let totals = if entry.kind.is_income() {
                (income.checked_add(entry.amount), Some(expense))
            } else {
                (Some(income), expense.checked_add(entry.amount))
            };
            match totals {
                (Some(income), Some(expense)) => Ok((income, expense)),
                _ => Err(StatementError::TotalOverflow),
            }
        })
}
