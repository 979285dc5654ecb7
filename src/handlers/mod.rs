//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Calls the ledger service
//! 3. Returns HTTP response (JSON, status code)

/// Liveness and storage connectivity
pub mod health;
/// Transfer endpoints
pub mod transfers;
/// User endpoints
pub mod users;
