//! User HTTP handlers.
//!
//! This module implements the user-related API endpoints:
//! - POST /api/v1/users - Create a user funded by the primary account
//! - GET /api/v1/users/{id} - Get a user's current balance

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, CreateUserResponse, UserId, UserResponse},
    services::SharedLedger,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

/// Create a new user.
///
/// # Request Body
///
/// ```json
/// { "balance": 1000 }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{ "id": "9f2c0e4b..." }`
/// - **Error (400)**: Negative balance or malformed body
/// - **Error (422)**: Primary account cannot fund the balance
/// - **Error (504)**: Deadline expired
pub async fn create_user(
    State(ledger): State<SharedLedger>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, AppError> {
    let Json(request) = payload?;

    let user = ledger.create_user(request.balance).await.inspect_err(|err| {
        tracing::error!(error = %err, balance = request.balance, "Create user failed");
    })?;
    tracing::info!(user_id = %user.id, balance = request.balance, "Create user succeeded");

    Ok(Json(CreateUserResponse { id: user.id }))
}

/// Get a user's latest committed balance.
///
/// # Response
///
/// - **Success (200 OK)**: `{ "id": "9f2c0e4b...", "balance": 1000 }`
/// - **Error (404)**: User does not exist
pub async fn get_user(
    State(ledger): State<SharedLedger>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = ledger.get_user(&UserId::new(user_id)).await?;

    Ok(Json(user.into()))
}
