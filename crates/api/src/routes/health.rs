//! Liveness endpoint.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service name.
    pub service: &'static str,
    /// Always `"healthy"` when the process can answer.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "tellr",
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Public routes that need no token.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
