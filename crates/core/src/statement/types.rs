//! Statement types.

use chrono::NaiveDate;
use serde::Serialize;
use tellr_shared::types::{Money, UserId};

use crate::ledger::{LedgerEntry, YearMonth};

/// Income and expense totals for one customer and one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatement {
    /// Customer.
    pub user_id: UserId,
    /// Month covered.
    pub period: YearMonth,
    /// First day of the month.
    pub period_start: NaiveDate,
    /// First day of the following month (exclusive).
    pub period_end: NaiveDate,
    /// Sum of deposits and incoming transfers.
    pub total_income: Money,
    /// Sum of outgoing transfers.
    pub total_expense: Money,
    /// `total_income - total_expense`.
    pub net_change: Money,
    /// Entries of the month in ledger order.
    pub entries: Vec<LedgerEntry>,
}
