//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod accounts;
pub mod health;
pub mod statement;
pub mod transactions;

/// Creates the API router; everything except health requires a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(transactions::routes())
        .merge(statement::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
