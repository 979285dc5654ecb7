//! Common test utilities

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use ledger_server::{
    config::DEFAULT_PRIMARY_USER_ID,
    models::{User, UserId},
    routes,
    services::LedgerService,
    store::{LedgerStore, MemoryLedgerStore},
};
use serde_json::Value;
use tower::ServiceExt;

pub fn primary_id() -> UserId {
    UserId::new(DEFAULT_PRIMARY_USER_ID)
}

/// Router over a fresh in-memory store whose primary account holds `issuance`.
pub async fn setup_app(issuance: i64) -> (Router, MemoryLedgerStore) {
    let store = MemoryLedgerStore::new();
    store
        .ensure_user(&User {
            id: primary_id(),
            balance: issuance,
        })
        .await
        .expect("Failed to seed primary account");

    let ledger = LedgerService::new(
        Arc::new(store.clone()),
        primary_id(),
        Duration::from_secs(2),
    );

    (routes::router(Arc::new(ledger)), store)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Create a user through the API and return its id.
pub async fn create_user(app: &Router, balance: i64) -> String {
    let request = serde_json::json!({ "balance": balance });
    let (status, body) = post_json(app, "/api/v1/users", request).await;
    assert_eq!(status, StatusCode::OK, "create user failed: {body}");
    body["id"].as_str().unwrap().to_string()
}
