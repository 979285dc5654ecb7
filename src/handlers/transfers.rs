//! Transfer HTTP handlers.
//!
//! - POST /api/v1/transfers - Move value between two users

use crate::{
    error::AppError,
    models::transaction::{CreateTransferRequest, CreateTransferResponse},
    services::SharedLedger,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

/// Transfer value between users.
///
/// # Request Body
///
/// ```json
/// { "from": "9f2c0e4b...", "to": "1b0a9f2c...", "value": 250 }
/// ```
///
/// # Response (200)
///
/// ```json
/// { "new_balance_from": 750, "new_balance_to": 1250 }
/// ```
///
/// # Atomicity
///
/// Both balances and the log entry are written in one unit of work.
/// Either all of it is committed or none of it is.
pub async fn create_transfer(
    State(ledger): State<SharedLedger>,
    payload: Result<Json<CreateTransferRequest>, JsonRejection>,
) -> Result<Json<CreateTransferResponse>, AppError> {
    let Json(request) = payload?;

    let (new_balance_from, new_balance_to) = ledger
        .create_transfer(&request.from, &request.to, request.value)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = %err,
                from = %request.from,
                to = %request.to,
                value = request.value,
                "Create transfer failed"
            );
        })?;
    tracing::info!(
        from = %request.from,
        to = %request.to,
        value = request.value,
        new_balance_from,
        new_balance_to,
        "Create transfer succeeded"
    );

    Ok(Json(CreateTransferResponse {
        new_balance_from,
        new_balance_to,
    }))
}
