//! Deposits, transfers and ledger history.

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    routing::get,
};
use chrono::NaiveDate;
use futures::TryStreamExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tellr_core::account::AccountError;
use tellr_core::ledger::{DateRange, LedgerEntry, YearMonth};
use tellr_core::statement::StatementError;
use tellr_core::transfer::{TransferKind, TransferReceipt, TransferRequest};
use tellr_shared::types::{AccountId, Money};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/transactions",
        get(list_transactions).post(create_transaction),
    )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a deposit or transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Debited account of a transfer, credited account of a deposit.
    pub account_id: AccountId,
    /// `deposit` or `transfer`.
    #[serde(rename = "type")]
    pub kind: TransferKind,
    /// Positive amount with at most two decimals.
    pub amount: Decimal,
    /// Business date (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Free-form label.
    pub category: String,
    /// Credited account of a transfer.
    pub recipient_account_id: Option<AccountId>,
    /// Optional note.
    pub description: Option<String>,
}

/// Response for an accepted deposit or transfer.
#[derive(Debug, Serialize)]
pub struct TransactionCreated {
    /// Human-readable summary.
    pub message: String,
    /// Correlation ID, entry IDs and post-movement balances.
    #[serde(flatten)]
    pub receipt: TransferReceipt,
}

/// Query parameters for listing ledger entries.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Comma-separated account IDs. Defaults to all of the caller's accounts.
    pub account_ids: Option<String>,
    /// First included business date.
    pub start: Option<NaiveDate>,
    /// Last included business date.
    pub end: Option<NaiveDate>,
    /// Calendar month (1-12), together with `year`.
    pub month: Option<u32>,
    /// Calendar year, together with `month`.
    pub year: Option<i32>,
}

impl ListTransactionsQuery {
    /// Resolves the requested business-date window.
    fn range(&self) -> ApiResult<DateRange> {
        match (self.month, self.year) {
            (None, None) => {}
            (Some(month), Some(year)) => {
                if self.start.is_some() || self.end.is_some() {
                    return Err(ApiError::validation(
                        "use either month/year or start/end, not both",
                    ));
                }
                return YearMonth::new(year, month)
                    .map(YearMonth::range)
                    .ok_or_else(|| StatementError::InvalidPeriod { month, year }.into());
            }
            _ => return Err(ApiError::validation("month and year must be given together")),
        }

        let end = match self.end {
            Some(end) => Some(
                end.succ_opt()
                    .ok_or_else(|| ApiError::validation("end date out of range"))?,
            ),
            None => None,
        };
        DateRange::new(self.start, end)
            .ok_or_else(|| ApiError::validation("end date is before start date"))
    }

    fn account_ids(&self) -> ApiResult<Option<Vec<AccountId>>> {
        let Some(raw) = self.account_ids.as_deref() else {
            return Ok(None);
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<AccountId>()
                    .map_err(|_| ApiError::validation(format!("invalid account id '{part}'")))
            })
            .collect::<ApiResult<Vec<_>>>()
            .map(Some)
    }
}

fn idempotency_key(headers: &HeaderMap) -> ApiResult<Option<String>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| ApiError::validation("Idempotency-Key must be visible ASCII"))?
        .trim();
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ApiError::validation(format!(
            "Idempotency-Key must be 1 to {MAX_IDEMPOTENCY_KEY_LEN} characters"
        )));
    }
    Ok(Some(key.to_string()))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/transactions` - Deposit into or transfer from one of the caller's accounts.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionCreated>)> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let amount = Money::new(payload.amount)
        .map_err(|e| ApiError::new(400, "INVALID_AMOUNT", e.to_string()))?;

    let request = TransferRequest {
        initiated_by: auth.user_id(),
        account_id: payload.account_id,
        recipient_id: payload.recipient_account_id,
        kind: payload.kind,
        amount,
        occurred_at: payload.date,
        category: payload.category,
        description: payload.description,
        idempotency_key: idempotency_key(&headers)?,
    };

    let receipt = state.engine.execute(request).await?;
    let message = match receipt.kind {
        TransferKind::Deposit => "Deposit recorded",
        TransferKind::Transfer => "Transfer completed",
    };

    Ok((
        StatusCode::CREATED,
        Json(TransactionCreated {
            message: message.to_string(),
            receipt,
        }),
    ))
}

/// GET `/transactions` - Ledger entries of the caller's accounts in ledger order.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LedgerEntry>>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let range = query.range()?;

    let owned = state.history.user_accounts(auth.user_id()).await?;
    let accounts = match query.account_ids()? {
        Some(requested) => {
            if let Some(foreign) = requested.iter().find(|id| !owned.contains(id)) {
                return Err(AccountError::NotFound(*foreign).into());
            }
            requested
        }
        None => owned,
    };

    let entries: Vec<LedgerEntry> = state
        .history
        .by_accounts(accounts, range)
        .try_collect()
        .await?;
    Ok(Json(entries))
}
