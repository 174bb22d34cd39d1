//! End-to-end HTTP tests for deposits, transfers and history.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use tellr_shared::types::{AccountId, UserId};

use common::test_app;

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = test_app();
    let (status, body) = app
        .send(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = test_app();
    let (status, body) = app
        .send(
            Request::get("/api/v1/transactions")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_transfer_returns_receipt() {
    let app = test_app();
    let user = UserId::new();
    let a = app.open(user, dec!(500)).await;
    let b = app.open(user, dec!(0)).await;

    let (status, body) = app
        .post(
            user,
            "/api/v1/transactions",
            &json!({
                "accountId": a,
                "type": "transfer",
                "amount": "200.00",
                "date": "2024-03-10",
                "category": "savings",
                "recipientAccountId": b,
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Transfer completed");
    assert_eq!(body["entryIds"].as_array().unwrap().len(), 2);
    assert_eq!(body["balance"], "300.00");
    assert_eq!(body["recipientBalance"], "200.00");
    assert!(body["correlationId"].is_string());
    assert_eq!(app.balance(a).await, dec!(300));
}

#[tokio::test]
async fn test_overdraft_is_unprocessable() {
    let app = test_app();
    let user = UserId::new();
    let a = app.open(user, dec!(500)).await;
    let b = app.open(user, dec!(0)).await;

    let (status, body) = app
        .post(
            user,
            "/api/v1/transactions",
            &json!({
                "accountId": a,
                "type": "transfer",
                "amount": 600,
                "date": "2024-03-10",
                "category": "savings",
                "recipientAccountId": b,
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "INSUFFICIENT_FUNDS");
    assert_eq!(app.balance(a).await, dec!(500));
}

#[tokio::test]
async fn test_amount_with_three_decimals_is_invalid() {
    let app = test_app();
    let user = UserId::new();
    let a = app.open(user, dec!(10)).await;

    let (status, body) = app
        .post(
            user,
            "/api/v1/transactions",
            &json!({
                "accountId": a,
                "type": "deposit",
                "amount": "1.005",
                "date": "2024-03-10",
                "category": "cash",
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = test_app();
    let (status, body) = app
        .post(
            UserId::new(),
            "/api/v1/transactions",
            &json!({ "type": "deposit" }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_idempotency_key_replays_without_moving_money() {
    let app = test_app();
    let user = UserId::new();
    let a = app.open(user, dec!(100)).await;
    let payload = json!({
        "accountId": a,
        "type": "deposit",
        "amount": "25.50",
        "date": "2024-03-05",
        "category": "salary",
    });

    let (first_status, first) = app
        .post(user, "/api/v1/transactions", &payload, Some("dep-1"))
        .await;
    let (second_status, second) = app
        .post(user, "/api/v1/transactions", &payload, Some("dep-1"))
        .await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CREATED);
    assert_eq!(first["correlationId"], second["correlationId"]);
    assert_eq!(app.balance(a).await, dec!(125.50));

    let mut changed = payload.clone();
    changed["amount"] = json!("30.00");
    let (status, body) = app
        .post(user, "/api/v1/transactions", &changed, Some("dep-1"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "IDEMPOTENCY_KEY_REUSED");
}

#[tokio::test]
async fn test_history_is_ordered_and_scoped_to_caller() {
    let app = test_app();
    let user = UserId::new();
    let a = app.open(user, dec!(0)).await;
    let b = app.open(user, dec!(0)).await;

    for (account, date) in [(a, "2024-03-20"), (b, "2024-03-01"), (a, "2024-04-02")] {
        let (status, _) = app
            .post(
                user,
                "/api/v1/transactions",
                &json!({
                    "accountId": account,
                    "type": "deposit",
                    "amount": "10",
                    "date": date,
                    "category": "cash",
                }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get(user, "/api/v1/transactions").await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["occurredAt"].as_str().unwrap())
        .collect();
    assert_eq!(dates, ["2024-03-01", "2024-03-20", "2024-04-02"]);

    let (_, march) = app
        .get(user, &format!("/api/v1/transactions?accountIds={a}&month=3&year=2024"))
        .await;
    assert_eq!(march.as_array().unwrap().len(), 1);

    let (_, inclusive) = app
        .get(user, "/api/v1/transactions?start=2024-03-01&end=2024-03-20")
        .await;
    assert_eq!(inclusive.as_array().unwrap().len(), 2);

    let stranger = UserId::new();
    let (status, body) = app
        .get(stranger, &format!("/api/v1/transactions?accountIds={a}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ACCOUNT_NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_recipient_is_rejected() {
    let app = test_app();
    let user = UserId::new();
    let a = app.open(user, dec!(50)).await;

    let (status, body) = app
        .post(
            user,
            "/api/v1/transactions",
            &json!({
                "accountId": a,
                "type": "transfer",
                "amount": "5",
                "date": "2024-03-10",
                "category": "gift",
                "recipientAccountId": AccountId::new(),
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "UNKNOWN_RECIPIENT");
    assert_eq!(app.balance(a).await, dec!(50));
}
