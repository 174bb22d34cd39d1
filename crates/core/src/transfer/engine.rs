//! The transfer state machine.

use std::sync::Arc;

use tellr_shared::types::{AccountId, CorrelationId, Money};
use tracing::Instrument;

use super::error::TransferError;
use super::idempotency::{Claim, IdempotencyRecord, IdempotencyStage, IdempotencyStore};
use super::retry::RetryPolicy;
use super::types::{TransferKind, TransferReceipt, TransferRequest, TransferState};
use crate::account::{Account, AccountStore, AdjustError};
use crate::error::StoreError;
use crate::ledger::{Ledger, LedgerEntry};

/// Executes deposits and transfers against an account store and a ledger.
///
/// The engine is the only component that writes both balances and history.
/// It is cheap to clone; all stores are shared.
#[derive(Clone)]
pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn Ledger>,
    idempotency: Arc<dyn IdempotencyStore>,
    retry: RetryPolicy,
}

impl TransferEngine {
    /// Creates a new engine with the default retry policy.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn Ledger>,
        idempotency: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            accounts,
            ledger,
            idempotency,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy used for every storage call.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Executes a deposit or transfer.
    ///
    /// The work runs on its own task: once accepted, dropping the returned future
    /// does not stop the engine between the debit and the credit or compensation.
    pub async fn execute(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let engine = self.clone();
        let span = tracing::info_span!(
            "transfer",
            kind = %request.kind,
            account_id = %request.account_id,
            user_id = %request.initiated_by,
        );

        match tokio::spawn(async move { engine.run(request).await }.instrument(span)).await {
            Ok(result) => result,
            Err(join_error) => {
                tracing::error!(error = %join_error, "Transfer task aborted");
                Err(TransferError::Aborted(join_error.to_string()))
            }
        }
    }

    async fn run(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let correlation_id = CorrelationId::new();
        tracing::debug!(
            %correlation_id,
            state = %TransferState::Validating,
            amount = %request.amount,
            "Transfer started"
        );

        let result = self.run_claimed(&request, correlation_id).await;
        report(&request, &result);
        result
    }

    async fn run_claimed(
        &self,
        request: &TransferRequest,
        correlation_id: CorrelationId,
    ) -> Result<TransferReceipt, TransferError> {
        check_shape(request)?;

        let Some(key) = request.idempotency_key.as_deref() else {
            return self.process(request, correlation_id, None).await;
        };

        let fingerprint = request.fingerprint();
        let claim = self
            .retry
            .run("claim idempotency key", || {
                self.idempotency
                    .claim(request.initiated_by, key, correlation_id, &fingerprint)
            })
            .await
            .map_err(|source| TransferError::Storage {
                step: TransferState::Validating,
                source,
            })?;

        match claim {
            Claim::Fresh => {
                let outcome = self.process(request, correlation_id, Some(key)).await;
                self.settle(request, key, &outcome).await;
                outcome
            }
            Claim::Existing(record) => self.replay(request, key, record).await,
        }
    }

    async fn process(
        &self,
        request: &TransferRequest,
        correlation_id: CorrelationId,
        key: Option<&str>,
    ) -> Result<TransferReceipt, TransferError> {
        let sender = self.load_sender(request).await?;
        let recipient = match request.effective_recipient() {
            Some(id) => Some(self.load_recipient(id).await?),
            None => None,
        };

        tracing::debug!(%correlation_id, state = %TransferState::Reserving, "Moving balances");
        let (balance, recipient_balance) = match &recipient {
            None => (self.credit_deposit(request).await?, None),
            Some(recipient) => {
                let (sent, received) = self
                    .move_funds(request, recipient.id, correlation_id)
                    .await?;
                (sent, Some(received))
            }
        };

        if let Some(key) = key {
            self.mark_applied(request, key, correlation_id).await;
        }

        let entries = self.record(request, correlation_id).await?;

        Ok(TransferReceipt {
            correlation_id,
            kind: request.kind,
            entry_ids: entries.iter().map(|entry| entry.id).collect(),
            account_id: sender.id,
            balance,
            recipient_id: recipient.as_ref().map(|r| r.id),
            recipient_balance: recipient
                .as_ref()
                .filter(|r| r.owner_id == request.initiated_by)
                .and(recipient_balance),
        })
    }

    async fn load_sender(&self, request: &TransferRequest) -> Result<Account, TransferError> {
        let account = self
            .retry
            .run("load sender", || self.accounts.get(request.account_id))
            .await
            .map_err(|source| TransferError::Storage {
                step: TransferState::Validating,
                source,
            })?;

        match account {
            Some(account) if account.owner_id == request.initiated_by => {
                if account.is_active() {
                    Ok(account)
                } else {
                    Err(TransferError::SenderInactive(account.id))
                }
            }
            _ => Err(TransferError::SenderNotFound(request.account_id)),
        }
    }

    async fn load_recipient(&self, id: AccountId) -> Result<Account, TransferError> {
        let account = self
            .retry
            .run("load recipient", || self.accounts.get(id))
            .await
            .map_err(|source| TransferError::Storage {
                step: TransferState::Validating,
                source,
            })?;

        account
            .filter(Account::is_active)
            .ok_or(TransferError::UnknownRecipient(id))
    }

    async fn credit_deposit(&self, request: &TransferRequest) -> Result<Money, TransferError> {
        self.retry
            .run("credit deposit", || {
                self.accounts
                    .adjust_balance(request.account_id, request.amount)
            })
            .await
            .map(|account| account.balance)
            .map_err(|e| match e {
                AdjustError::NotFound(id) => TransferError::SenderNotFound(id),
                AdjustError::Inactive(id) => TransferError::SenderInactive(id),
                other => TransferError::Storage {
                    step: TransferState::Reserving,
                    source: other.into_store_error(),
                },
            })
    }

    /// Debits the sender, then credits the recipient, compensating on failure.
    async fn move_funds(
        &self,
        request: &TransferRequest,
        recipient_id: AccountId,
        correlation_id: CorrelationId,
    ) -> Result<(Money, Money), TransferError> {
        let sender_id = request.account_id;
        let amount = request.amount;

        let debited = self
            .retry
            .run("debit sender", || self.accounts.adjust_balance(sender_id, -amount))
            .await
            .map_err(|e| match e {
                AdjustError::InsufficientFunds {
                    account_id,
                    balance,
                    requested,
                } => TransferError::InsufficientFunds {
                    account_id,
                    balance,
                    requested,
                },
                AdjustError::NotFound(id) => TransferError::SenderNotFound(id),
                AdjustError::Inactive(id) => TransferError::SenderInactive(id),
                AdjustError::Storage(source) => TransferError::Storage {
                    step: TransferState::Reserving,
                    source,
                },
            })?;

        let credit_error = match self
            .retry
            .run("credit recipient", || {
                self.accounts.adjust_balance(recipient_id, amount)
            })
            .await
        {
            Ok(credited) => return Ok((debited.balance, credited.balance)),
            Err(e) => e,
        };

        tracing::warn!(
            %correlation_id,
            sender = %sender_id,
            recipient = %recipient_id,
            %amount,
            error = %credit_error,
            "Credit failed, re-crediting sender"
        );

        match self
            .retry
            .run("compensate sender", || self.accounts.refund(sender_id, amount))
            .await
        {
            // Recipient closed or vanished after validation.
            Ok(_) => match credit_error {
                AdjustError::NotFound(id) | AdjustError::Inactive(id) => {
                    Err(TransferError::UnknownRecipient(id))
                }
                other => Err(TransferError::Compensated {
                    correlation_id,
                    source: other.into_store_error(),
                }),
            },
            Err(e) => {
                let credit_error = credit_error.into_store_error();
                let compensation_error = e.into_store_error();
                tracing::error!(
                    %correlation_id,
                    sender = %sender_id,
                    recipient = %recipient_id,
                    %amount,
                    step = "compensating",
                    %credit_error,
                    %compensation_error,
                    "Compensation failed, sender left short"
                );
                Err(TransferError::DoubleFailure {
                    correlation_id,
                    sender: sender_id,
                    amount,
                    credit_error,
                    compensation_error,
                })
            }
        }
    }

    async fn mark_applied(&self, request: &TransferRequest, key: &str, correlation_id: CorrelationId) {
        let result = self
            .retry
            .run("mark idempotency key applied", || {
                self.idempotency.mark_applied(request.initiated_by, key)
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(%correlation_id, error = %e, "Could not mark idempotency key as applied");
        }
    }

    async fn record(
        &self,
        request: &TransferRequest,
        correlation_id: CorrelationId,
    ) -> Result<Vec<LedgerEntry>, TransferError> {
        tracing::debug!(%correlation_id, state = %TransferState::Recording, "Appending entries");
        let entries = request.entries(correlation_id);

        let appended = match self
            .retry
            .run("append entries", || self.ledger.append_all(entries.clone()))
            .await
        {
            // Another attempt for the same movement recorded it first.
            Err(StoreError::Duplicate) => {
                tracing::info!(%correlation_id, "Entries already recorded, reusing them");
                self.retry
                    .run("load entries", || self.ledger.by_correlation(correlation_id))
                    .await
                    .and_then(|existing| {
                        if existing.is_empty() {
                            Err(StoreError::Corrupt(format!(
                                "duplicate append for {correlation_id} left no entries"
                            )))
                        } else {
                            Ok(existing)
                        }
                    })
            }
            other => other,
        };

        appended.map_err(|source| {
            let accounts = touched_accounts(request);
            tracing::error!(
                %correlation_id,
                accounts = ?accounts,
                amount = %request.amount,
                step = %TransferState::Recording,
                error = %source,
                "Balances moved but ledger append failed"
            );
            TransferError::PartiallyCommitted {
                correlation_id,
                accounts,
                source,
            }
        })
    }

    /// Answers a request whose idempotency key was already claimed.
    async fn replay(
        &self,
        request: &TransferRequest,
        key: &str,
        record: IdempotencyRecord,
    ) -> Result<TransferReceipt, TransferError> {
        if record.fingerprint != request.fingerprint() {
            return Err(TransferError::IdempotencyKeyReused(key.to_string()));
        }

        match record.stage {
            IdempotencyStage::Pending => Err(TransferError::DuplicateRequest(key.to_string())),
            IdempotencyStage::Committed => {
                tracing::debug!(correlation_id = %record.correlation_id, "Replaying stored receipt");
                record.receipt.ok_or_else(|| TransferError::Storage {
                    step: TransferState::Validating,
                    source: StoreError::Corrupt(format!("committed key '{key}' has no receipt")),
                })
            }
            IdempotencyStage::BalancesApplied => {
                self.resume(request, key, record.correlation_id).await
            }
        }
    }

    /// Finishes a request whose balances already moved, starting at `Recording`.
    async fn resume(
        &self,
        request: &TransferRequest,
        key: &str,
        correlation_id: CorrelationId,
    ) -> Result<TransferReceipt, TransferError> {
        tracing::info!(%correlation_id, "Resuming transfer at recording step");

        let existing = self
            .retry
            .run("load entries", || self.ledger.by_correlation(correlation_id))
            .await
            .map_err(|source| TransferError::PartiallyCommitted {
                correlation_id,
                accounts: touched_accounts(request),
                source,
            })?;

        let entries = if existing.is_empty() {
            self.record(request, correlation_id).await?
        } else {
            existing
        };

        let read_failed = |source| TransferError::Storage {
            step: TransferState::Committed,
            source,
        };
        let sender = self
            .accounts
            .get(request.account_id)
            .await
            .map_err(read_failed)?
            .ok_or(TransferError::SenderNotFound(request.account_id))?;
        let recipient = match request.effective_recipient() {
            Some(id) => self.accounts.get(id).await.map_err(read_failed)?,
            None => None,
        };

        let receipt = TransferReceipt {
            correlation_id,
            kind: request.kind,
            entry_ids: entries.iter().map(|entry| entry.id).collect(),
            account_id: sender.id,
            balance: sender.balance,
            recipient_id: request.effective_recipient(),
            recipient_balance: recipient
                .filter(|r| r.owner_id == request.initiated_by)
                .map(|r| r.balance),
        };

        if let Err(e) = self
            .idempotency
            .complete(request.initiated_by, key, &receipt)
            .await
        {
            tracing::warn!(%correlation_id, error = %e, "Could not store receipt for idempotency key");
        }
        Ok(receipt)
    }

    /// Updates the idempotency key after a first attempt.
    async fn settle(
        &self,
        request: &TransferRequest,
        key: &str,
        outcome: &Result<TransferReceipt, TransferError>,
    ) {
        let owner = request.initiated_by;
        let result = match outcome {
            Ok(receipt) => self.idempotency.complete(owner, key, receipt).await,
            Err(e)
                if e.is_rejection()
                    || matches!(
                        e,
                        TransferError::Storage { .. } | TransferError::Compensated { .. }
                    ) =>
            {
                self.idempotency.release(owner, key).await
            }
            // Keep the key: a retry must resume or stay blocked, never move money again.
            Err(_) => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Could not update idempotency key");
        }
    }
}

/// Checks that need no storage access.
fn check_shape(request: &TransferRequest) -> Result<(), TransferError> {
    if !request.amount.is_positive() {
        return Err(TransferError::InvalidAmount(request.amount));
    }
    if request.kind == TransferKind::Transfer {
        match request.recipient_id {
            None => return Err(TransferError::MissingRecipient),
            Some(recipient) if recipient == request.account_id => {
                return Err(TransferError::SelfTransfer);
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn touched_accounts(request: &TransferRequest) -> Vec<AccountId> {
    std::iter::once(request.account_id)
        .chain(request.effective_recipient())
        .collect()
}

fn report(request: &TransferRequest, result: &Result<TransferReceipt, TransferError>) {
    match result {
        Ok(receipt) => tracing::info!(
            correlation_id = %receipt.correlation_id,
            amount = %request.amount,
            entries = receipt.entry_ids.len(),
            state = %TransferState::Committed,
            "Transfer committed"
        ),
        Err(e) if e.is_rejection() => tracing::info!(
            amount = %request.amount,
            reason = e.error_code(),
            state = %TransferState::Rejected,
            "Transfer rejected: {e}"
        ),
        Err(e) if e.needs_reconciliation() => tracing::error!(
            amount = %request.amount,
            reason = e.error_code(),
            state = %TransferState::Failed,
            "Transfer needs reconciliation: {e}"
        ),
        Err(e) => tracing::warn!(
            amount = %request.amount,
            reason = e.error_code(),
            state = %e.final_state(),
            "Transfer failed: {e}"
        ),
    }
}
