//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Ledger entry model
pub mod transaction;
/// User and balance model
pub mod user;

pub use transaction::LedgerTransaction;
pub use user::{User, UserId};
