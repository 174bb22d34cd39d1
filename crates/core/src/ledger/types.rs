//! Ledger entry types, cursors and date ranges.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tellr_shared::types::{AccountId, CorrelationId, EntryId, Money};

/// Direction of a ledger entry relative to its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// Money paid into the account from outside the bank.
    Deposit,
    /// Money leaving the account towards another account.
    TransferOut,
    /// Money arriving from another account.
    TransferIn,
}

impl EntryKind {
    /// Returns the storage/wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::TransferOut => "transfer-out",
            Self::TransferIn => "transfer-in",
        }
    }

    /// Returns true if the entry increases the account balance.
    #[must_use]
    pub const fn is_income(self) -> bool {
        matches!(self, Self::Deposit | Self::TransferIn)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "transfer-out" => Ok(Self::TransferOut),
            "transfer-in" => Ok(Self::TransferIn),
            _ => Err(format!("Unknown entry kind: {s}")),
        }
    }
}

/// An immutable ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry ID, time-ordered.
    pub id: EntryId,
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Other side of a transfer.
    pub counterparty_id: Option<AccountId>,
    /// Shared by both legs of a transfer.
    pub correlation_id: CorrelationId,
    /// Direction.
    pub kind: EntryKind,
    /// Always positive; direction comes from `kind`.
    pub amount: Money,
    /// Free-form label, e.g. "groceries".
    pub category: String,
    /// Business date supplied by the caller.
    pub occurred_at: NaiveDate,
    /// Optional note.
    pub description: Option<String>,
    /// When the entry was appended.
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the position of this entry in ledger order.
    #[must_use]
    pub const fn cursor(&self) -> EntryCursor {
        EntryCursor {
            occurred_at: self.occurred_at,
            recorded_at: self.recorded_at,
            id: self.id,
        }
    }

    /// Returns the effect of this entry on its account balance.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        if self.kind.is_income() {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// An entry waiting to be appended. The ledger assigns `id` and `recorded_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Other side of a transfer.
    pub counterparty_id: Option<AccountId>,
    /// Shared by both legs of a transfer.
    pub correlation_id: CorrelationId,
    /// Direction.
    pub kind: EntryKind,
    /// Positive amount.
    pub amount: Money,
    /// Free-form label.
    pub category: String,
    /// Business date.
    pub occurred_at: NaiveDate,
    /// Optional note.
    pub description: Option<String>,
}

impl NewEntry {
    /// Materializes the entry with ledger-assigned fields.
    #[must_use]
    pub fn into_entry(self, id: EntryId, recorded_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id,
            account_id: self.account_id,
            counterparty_id: self.counterparty_id,
            correlation_id: self.correlation_id,
            kind: self.kind,
            amount: self.amount,
            category: self.category,
            occurred_at: self.occurred_at,
            description: self.description,
            recorded_at,
        }
    }
}

/// Position in ledger order: `occurred_at`, then `recorded_at`, then `id`.
///
/// Field order matters: the derived `Ord` is the ledger order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryCursor {
    /// Business date.
    pub occurred_at: NaiveDate,
    /// Append time.
    pub recorded_at: DateTime<Utc>,
    /// Entry ID.
    pub id: EntryId,
}

/// Half-open business-date window `[start, end)`. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First included date.
    pub start: Option<NaiveDate>,
    /// First excluded date.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Creates `[start, end)`; `None` if `end` precedes `start`.
    #[must_use]
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        match (start, end) {
            (Some(s), Some(e)) if e < s => None,
            _ => Some(Self { start, end }),
        }
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date < e)
    }
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
}

impl YearMonth {
    /// Creates a month; `None` if `month` is outside 1..=12 or the year is out of range.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let candidate = Self { year, month };
        candidate.first_day()?;
        candidate.next().first_day()?;
        Some(candidate)
    }

    /// The month containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The following month.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// `[first day, first day of next month)`.
    #[must_use]
    pub fn range(self) -> DateRange {
        DateRange {
            start: self.first_day(),
            end: self.next().first_day(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Selection of entries: a set of accounts and a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    /// Accounts to include, sorted and deduplicated.
    pub accounts: Vec<AccountId>,
    /// Business-date window.
    pub range: DateRange,
}

impl EntryQuery {
    /// Builds a query, normalizing the account set.
    pub fn new(accounts: impl IntoIterator<Item = AccountId>, range: DateRange) -> Self {
        let mut accounts: Vec<AccountId> = accounts.into_iter().collect();
        accounts.sort_unstable();
        accounts.dedup();
        Self { accounts, range }
    }

    /// Returns true if `entry` is selected by this query.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.accounts.binary_search(&entry.account_id).is_ok()
            && self.range.contains(entry.occurred_at)
    }
}
