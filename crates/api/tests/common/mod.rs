//! In-process router over the in-memory stores.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tellr_api::{AppState, create_router};
use tellr_core::account::{AccountStore, AccountType, NewAccount};
use tellr_core::memory::{MemoryAccountStore, MemoryIdempotencyStore, MemoryLedger};
use tellr_shared::JwtService;
use tellr_shared::config::{JwtConfig, LedgerConfig};
use tellr_shared::types::{AccountId, Money, UserId};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<MemoryAccountStore>,
    pub jwt: JwtService,
}

pub fn test_app() -> TestApp {
    let jwt_config = JwtConfig {
        secret: "test-secret-key-that-is-long-enough".to_string(),
        access_token_expiry_secs: 900,
    };
    let accounts = Arc::new(MemoryAccountStore::new());
    let state = AppState::new(
        accounts.clone(),
        Arc::new(MemoryLedger::new()),
        Arc::new(MemoryIdempotencyStore::new()),
        JwtService::new(&jwt_config),
        &LedgerConfig::default(),
    );
    TestApp {
        router: create_router(state),
        accounts,
        jwt: JwtService::new(&jwt_config),
    }
}

impl TestApp {
    pub fn token(&self, user: UserId) -> String {
        self.jwt.generate_access_token(user).unwrap()
    }

    pub async fn open(&self, owner: UserId, opening: Decimal) -> AccountId {
        self.accounts
            .open(NewAccount {
                owner_id: owner,
                account_type: AccountType::Checking,
                initial_deposit: Money::new(opening).unwrap(),
            })
            .await
            .unwrap()
            .id
    }

    pub async fn balance(&self, id: AccountId) -> Decimal {
        self.accounts.get(id).await.unwrap().unwrap().balance.amount()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, user: UserId, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post(
        &self,
        user: UserId,
        uri: &str,
        body: &Value,
        idempotency_key: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::post(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}
