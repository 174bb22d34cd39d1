//! Account opening, lookup and closing for the authenticated customer.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tellr_core::account::{Account, AccountType};
use tellr_shared::types::{AccountId, Money};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(open_account))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/{account_id}/close", post(close_account))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountRequest {
    /// `savings` or `checking`.
    pub account_type: AccountType,
    /// Opening balance, defaults to zero.
    #[serde(default)]
    pub initial_deposit: Decimal,
}

/// POST `/accounts` - Open an account for the caller.
async fn open_account(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<OpenAccountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let initial_deposit = Money::new(payload.initial_deposit)
        .map_err(|e| ApiError::new(400, "INVALID_AMOUNT", e.to_string()))?;

    let account = state
        .accounts
        .open(auth.user_id(), payload.account_type, initial_deposit)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/accounts` - List the caller's accounts.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.accounts.list(auth.user_id()).await?))
}

/// GET `/accounts/{account_id}`
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
) -> ApiResult<Json<Account>> {
    Ok(Json(
        state.accounts.get_owned(auth.user_id(), account_id).await?,
    ))
}

/// POST `/accounts/{account_id}/close` - Close an empty account.
async fn close_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
) -> ApiResult<Json<Account>> {
    Ok(Json(state.accounts.close(auth.user_id(), account_id).await?))
}
