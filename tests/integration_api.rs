//! HTTP API tests over the in-memory store.

use axum::http::StatusCode;
use ledger_server::{
    models::{User, UserId},
    store::LedgerStore,
};
use serde_json::json;

mod common;

#[tokio::test]
async fn test_health_check() {
    let (app, _) = common::setup_app(0).await;

    let (status, body) = common::get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_user_and_read_balance() {
    let (app, _) = common::setup_app(5_000).await;

    let id = common::create_user(&app, 1_000).await;
    assert_eq!(id.len(), 32);

    let (status, body) = common::get(&app, &format!("/api/v1/users/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 1_000);

    let primary = common::primary_id();
    let (_, body) = common::get(&app, &format!("/api/v1/users/{primary}")).await;
    assert_eq!(body["balance"], 4_000);
}

#[tokio::test]
async fn test_create_user_beyond_issuance() {
    let (app, store) = common::setup_app(100).await;

    common::create_user(&app, 50).await;
    let (status, body) = common::post_json(&app, "/api/v1/users", json!({ "balance": 60 })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_balance");
    assert_eq!(store.balances()[&common::primary_id()], 50);
}

#[tokio::test]
async fn test_create_user_negative_balance() {
    let (app, _) = common::setup_app(100).await;

    let (status, body) = common::post_json(&app, "/api/v1/users", json!({ "balance": -1 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "negative_value");
}

#[tokio::test]
async fn test_transfer_between_users() {
    let (app, store) = common::setup_app(1_000).await;
    let a = common::create_user(&app, 300).await;
    let b = common::create_user(&app, 100).await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/transfers",
        json!({ "from": a, "to": b, "value": 300 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "new_balance_from": 0, "new_balance_to": 400 }));
    // Two seeding entries and the transfer.
    assert_eq!(store.transactions().len(), 3);
}

#[tokio::test]
async fn test_rejected_transfers() {
    let (app, store) = common::setup_app(1_000).await;
    let a = common::create_user(&app, 10).await;
    let b = common::create_user(&app, 10).await;
    let before = (store.balances(), store.transactions());

    let cases = [
        (json!({ "from": a, "to": a, "value": 10 }), StatusCode::BAD_REQUEST, "same_account"),
        (json!({ "from": a, "to": b, "value": -1 }), StatusCode::BAD_REQUEST, "negative_value"),
        (
            json!({ "from": a, "to": b, "value": 11 }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_balance",
        ),
        (
            json!({ "from": a, "to": "0123456789abcdef0123456789abcdef", "value": 1 }),
            StatusCode::NOT_FOUND,
            "user_not_found",
        ),
    ];

    for (request, expected_status, expected_code) in cases {
        let (status, body) = common::post_json(&app, "/api/v1/transfers", request).await;
        assert_eq!(status, expected_status);
        assert_eq!(body["error"]["code"], expected_code);
    }

    assert_eq!((store.balances(), store.transactions()), before);
}

#[tokio::test]
async fn test_transfer_overflow() {
    // Issuance through the primary account can never exceed i64::MAX in
    // total, so the receiver is seeded directly in the store.
    let (app, store) = common::setup_app(0).await;
    for (id, balance) in [("a", 10), ("b", i64::MAX)] {
        store
            .ensure_user(&User {
                id: UserId::new(id),
                balance,
            })
            .await
            .unwrap();
    }
    let before = (store.balances(), store.transactions());

    let (status, body) = common::post_json(
        &app,
        "/api/v1/transfers",
        json!({ "from": "a", "to": "b", "value": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "balance_overflow");
    assert_eq!((store.balances(), store.transactions()), before);
}

#[tokio::test]
async fn test_unknown_user_lookup() {
    let (app, _) = common::setup_app(0).await;

    let (status, body) = common::get(&app, "/api/v1/users/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "user_not_found");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, store) = common::setup_app(1_000).await;
    let before = (store.balances(), store.transactions());

    let cases = [
        // Missing fields
        ("/api/v1/transfers", json!({ "from": "a" })),
        // Wrong type
        ("/api/v1/users", json!({ "balance": "ten" })),
        // Does not fit in i64
        ("/api/v1/users", json!({ "balance": 9_223_372_036_854_775_808u64 })),
    ];

    for (uri, request) in cases {
        let (status, body) = common::post_json(&app, uri, request.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {request}");
        assert_eq!(body["error"]["code"], "invalid_request", "{uri} {request}");
        assert!(body["error"]["message"].is_string());
    }

    assert_eq!((store.balances(), store.transactions()), before);
}
