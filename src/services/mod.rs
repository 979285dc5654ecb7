//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle units of work, validation, and lock ordering.

pub mod ledger_service;

pub use ledger_service::LedgerService;

/// Ledger service shared with every handler through Axum state.
pub type SharedLedger = std::sync::Arc<LedgerService>;
