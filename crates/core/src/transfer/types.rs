//! Transfer request, receipt and state types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tellr_shared::types::{AccountId, CorrelationId, EntryId, Money, UserId};

use crate::ledger::{EntryKind, NewEntry};

/// What kind of money movement is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Cash paid into one account.
    Deposit,
    /// Money moved from one account to another.
    Transfer,
}

impl TransferKind {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deposit or transfer, as submitted by a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Authenticated customer submitting the request.
    pub initiated_by: UserId,
    /// Account debited by a transfer, or credited by a deposit.
    pub account_id: AccountId,
    /// Account credited by a transfer. Ignored for deposits.
    pub recipient_id: Option<AccountId>,
    /// Deposit or transfer.
    pub kind: TransferKind,
    /// Amount to move, must be positive.
    pub amount: Money,
    /// Business date.
    pub occurred_at: NaiveDate,
    /// Free-form label.
    pub category: String,
    /// Optional note.
    pub description: Option<String>,
    /// Client-chosen key making retries safe.
    pub idempotency_key: Option<String>,
}

impl TransferRequest {
    /// Recipient that actually takes part in the movement.
    #[must_use]
    pub fn effective_recipient(&self) -> Option<AccountId> {
        match self.kind {
            TransferKind::Deposit => None,
            TransferKind::Transfer => self.recipient_id,
        }
    }

    /// Canonical description of the payload, used to detect reuse of an
    /// idempotency key with a different request.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.kind,
            self.account_id,
            self.effective_recipient()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            self.amount,
            self.occurred_at,
            self.category,
            self.description.as_deref().unwrap_or_default(),
        )
    }

    /// Ledger entries recording this movement.
    pub(crate) fn entries(&self, correlation_id: CorrelationId) -> Vec<NewEntry> {
        let entry = |account_id, counterparty_id, kind| NewEntry {
            account_id,
            counterparty_id,
            correlation_id,
            kind,
            amount: self.amount,
            category: self.category.clone(),
            occurred_at: self.occurred_at,
            description: self.description.clone(),
        };

        match self.effective_recipient() {
            None => vec![entry(self.account_id, None, EntryKind::Deposit)],
            Some(recipient) => vec![
                entry(self.account_id, Some(recipient), EntryKind::TransferOut),
                entry(recipient, Some(self.account_id), EntryKind::TransferIn),
            ],
        }
    }
}

/// Outcome of a committed deposit or transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    /// Shared by every entry written.
    pub correlation_id: CorrelationId,
    /// Deposit or transfer.
    pub kind: TransferKind,
    /// Entries appended, in ledger order.
    pub entry_ids: Vec<EntryId>,
    /// Debited (transfer) or credited (deposit) account.
    pub account_id: AccountId,
    /// Its balance right after the movement.
    pub balance: Money,
    /// Credited account of a transfer.
    pub recipient_id: Option<AccountId>,
    /// Its balance, reported only when the initiator owns it.
    pub recipient_balance: Option<Money>,
}

/// Steps of the transfer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Checking the request and the accounts involved.
    Validating,
    /// Moving balances.
    Reserving,
    /// Appending ledger entries.
    Recording,
    /// Done; balances and history agree.
    Committed,
    /// Refused before anything changed.
    Rejected,
    /// Stopped after a storage failure.
    Failed,
}

impl TransferState {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Reserving => "reserving",
            Self::Recording => "recording",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
