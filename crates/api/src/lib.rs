//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tellr_core::account::{AccountService, AccountStore};
use tellr_core::ledger::{HistoryService, Ledger};
use tellr_core::statement::StatementBuilder;
use tellr_core::transfer::{IdempotencyStore, RetryPolicy, TransferEngine};
use tellr_shared::JwtService;
use tellr_shared::config::LedgerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Deposits and transfers.
    pub engine: TransferEngine,
    /// Ledger queries.
    pub history: HistoryService,
    /// Monthly statements.
    pub statements: StatementBuilder,
    /// Account lifecycle.
    pub accounts: AccountService,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    /// Wires the services over the given stores.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn Ledger>,
        idempotency: Arc<dyn IdempotencyStore>,
        jwt_service: JwtService,
        config: &LedgerConfig,
    ) -> Self {
        let engine = TransferEngine::new(Arc::clone(&accounts), Arc::clone(&ledger), idempotency)
            .with_retry(RetryPolicy::from_config(config));
        let history = HistoryService::new(ledger, Arc::clone(&accounts))
            .with_page_size(usize::try_from(config.page_size).unwrap_or(usize::MAX));

        Self {
            engine,
            statements: StatementBuilder::new(history.clone()),
            history,
            accounts: AccountService::new(accounts),
            jwt_service: Arc::new(jwt_service),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
