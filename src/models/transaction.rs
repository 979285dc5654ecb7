//! Ledger entry models and transfer request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// An immutable ledger entry.
///
/// # Database Table
///
/// Maps to the `transactions` table. Entries are appended once and never
/// updated or deleted. The identifier and timestamp are assigned by the
/// engine, not by the caller.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct LedgerTransaction {
    pub id: Uuid,

    /// Debited user
    pub from_id: UserId,

    /// Credited user
    pub to_id: UserId,

    /// Amount in minor units
    pub value: i64,

    pub timestamp: DateTime<Utc>,
}

impl LedgerTransaction {
    /// Build a new entry with a fresh id and the current time.
    pub fn new(from_id: UserId, to_id: UserId, value: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_id,
            to_id,
            value,
            timestamp: Utc::now(),
        }
    }
}

/// Request to move value between two users.
///
/// # JSON Example
///
/// ```json
/// {
///   "from": "9f2c0e4b7a1d4c3e8b6a5f4e3d2c1b0a",
///   "to": "1b0a9f2c0e4b7a1d4c3e8b6a5f4e3d2c",
///   "value": 250
/// }
/// ```
///
/// `value` is not checked on deserialization. Negative or excessive values
/// are rejected by the ledger engine.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub from: UserId,
    pub to: UserId,
    pub value: i64,
}

/// Balances of both parties after a committed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransferResponse {
    pub new_balance_from: i64,
    pub new_balance_to: i64,
}
