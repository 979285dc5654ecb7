//! Ledger server library.
//!
//! A minimal ledger that creates users funded by a primary account and moves
//! value between users with atomic transfers. Balances are materialized next
//! to an append-only transaction log, and every operation runs in one unit of
//! work against a pluggable store (PostgreSQL or in-memory).

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
