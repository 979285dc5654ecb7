//! Error types and HTTP error response handling.
//!
//! This module defines the ledger error taxonomy and how it is converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;

use crate::models::UserId;

/// Errors produced by the ledger engine and its stores.
///
/// Every variant aborts the enclosing unit of work. A call that fails with
/// any of these leaves balances and the transaction log unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("cannot transfer to the same account")]
    SameAccount,

    #[error("transfer value must not be negative")]
    NegativeValue,

    #[error("insufficient balance for user {0}")]
    InsufficientBalance(UserId),

    /// Crediting the user would exceed `i64::MAX`.
    #[error("balance of user {0} would overflow")]
    Overflow(UserId),

    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("operation did not finish within {0:?}")]
    Timeout(Duration),

    /// Begin, lock, read, write or commit failed in the storage layer.
    ///
    /// `step` names the operation that failed, `source` carries the cause.
    #[error("storage failure while {step}: {source}")]
    Storage {
        step: &'static str,
        #[source]
        source: StorageError,
    },
}

/// Causes of a storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("expected to affect 1 row, affected {0}")]
    RowCount(u64),

    #[error("duplicate user id {0}")]
    DuplicateUser(UserId),
}

/// Attach the failing step to a storage result.
pub(crate) trait StorageStep<T> {
    fn step(self, step: &'static str) -> Result<T, LedgerError>;
}

impl<T, E: Into<StorageError>> StorageStep<T> for Result<T, E> {
    fn step(self, step: &'static str) -> Result<T, LedgerError> {
        self.map_err(|e| LedgerError::Storage {
            step,
            source: e.into(),
        })
    }
}

/// Application-wide HTTP error type.
///
/// # Error Categories
///
/// - **Ledger Errors**: Validation, lookup, timeout and storage failures from the engine
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Malformed JSON bodies: missing fields, wrong types, numbers out of range.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `SameAccount`, `NegativeValue`, `InvalidRequest` → 400 Bad Request
/// - `NotFound` → 404 Not Found
/// - `InsufficientBalance`, `Overflow` → 422 Unprocessable Entity
/// - `Timeout` → 504 Gateway Timeout
/// - `Storage` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Ledger(ref err) => match err {
                LedgerError::SameAccount => {
                    (StatusCode::BAD_REQUEST, "same_account", err.to_string())
                }
                LedgerError::NegativeValue => {
                    (StatusCode::BAD_REQUEST, "negative_value", err.to_string())
                }
                LedgerError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "user_not_found", err.to_string())
                }
                LedgerError::InsufficientBalance(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "insufficient_balance",
                    err.to_string(),
                ),
                LedgerError::Overflow(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "balance_overflow",
                    err.to_string(),
                ),
                LedgerError::Timeout(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout", err.to_string())
                }
                LedgerError::Storage { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                ),
            },
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
