//! User data models and API request/response types.
//!
//! This module defines:
//! - `UserId`: Opaque user identifier
//! - `User`: Database entity holding a materialized balance
//! - `CreateUserRequest` / `CreateUserResponse`: Request and response bodies for user creation
//! - `UserResponse`: Response body for balance lookups

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier.
///
/// Generated identifiers are 128 random bits rendered as 32 lowercase hex
/// characters. Ordering is lexicographic on the string form, which is the
/// order row locks are taken in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocate a fresh identifier from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a user record from the database.
///
/// # Balance Storage
///
/// Balances are stored as `i64` minor units. The value is materialized: it is
/// updated together with every log entry that references the user and is
/// never recomputed from the log.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct User {
    /// Unique identifier for this user
    pub id: UserId,

    /// Current balance in minor units, never negative at rest
    pub balance: i64,
}

/// Request body for creating a new user.
///
/// # JSON Example
///
/// ```json
/// { "balance": 1000 }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Opening balance, funded by the primary account
    pub balance: i64,
}

/// Response body for user creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub id: UserId,
}

/// Response body for balance lookups.
///
/// # JSON Example
///
/// ```json
/// { "id": "9f2c0e4b7a1d4c3e8b6a5f4e3d2c1b0a", "balance": 1000 }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub balance: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            balance: user.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_32_hex_chars() {
        let id = UserId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_order_lexicographically() {
        assert!(UserId::new("0a") < UserId::new("0b"));
        assert!(UserId::new("10") > UserId::new("0f"));
    }
}
