//! Monthly statement for the authenticated customer.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::Deserialize;
use tellr_core::statement::MonthlyStatement;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser};

/// Creates the statement routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/statement", get(monthly_statement))
}

/// Query parameters for a statement.
#[derive(Debug, Deserialize)]
pub struct StatementQuery {
    /// Calendar month (1-12).
    pub month: Option<u32>,
    /// Calendar year.
    pub year: Option<i32>,
}

/// GET `/statement?month=&year=` - Income and expense totals for one month.
async fn monthly_statement(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<StatementQuery>, QueryRejection>,
) -> ApiResult<Json<MonthlyStatement>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let (Some(month), Some(year)) = (query.month, query.year) else {
        return Err(ApiError::validation("month and year are required"));
    };

    let statement = state
        .statements
        .monthly_statement(auth.user_id(), month, year)
        .await?;
    Ok(Json(statement))
}
