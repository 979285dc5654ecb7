//! Storage contracts for the ledger.
//!
//! A `LedgerStore` hands out units of work. A `UnitOfWork` is one atomic,
//! all-or-nothing sequence of reads and writes combining the user store and
//! the transaction log. Nothing written through it becomes visible to other
//! units of work until `commit` succeeds.
//!
//! # Release Guarantees
//!
//! Implementations must release every row lock and discard staged writes
//! when the handle is dropped without `commit`. The engine relies on this to
//! roll back on timeouts (the future is dropped) and panics.

use async_trait::async_trait;

use crate::{
    error::LedgerError,
    models::{LedgerTransaction, User, UserId},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Row-level access to users inside a unit of work.
#[async_trait]
pub trait UserStore: Send {
    /// Read a user row and hold an exclusive lock on it until the unit of
    /// work ends. Blocks while another unit of work holds the lock.
    ///
    /// Locking a row this unit of work already holds returns its current
    /// (possibly staged) state without blocking.
    async fn lock_user(&mut self, id: &UserId) -> Result<User, LedgerError>;

    async fn insert_user(&mut self, user: &User) -> Result<(), LedgerError>;

    /// Persist a new balance for an existing user.
    async fn update_user(&mut self, user: &User) -> Result<(), LedgerError>;
}

/// Append-only access to the transaction log inside a unit of work.
#[async_trait]
pub trait TransactionLog: Send {
    async fn append_transaction(&mut self, entry: &LedgerTransaction) -> Result<(), LedgerError>;
}

/// An open unit of work over both stores.
#[async_trait]
pub trait UnitOfWork: UserStore + TransactionLog {
    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}

/// Entry point to a ledger storage backend.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a unit of work at READ COMMITTED isolation or stronger.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError>;

    /// Latest committed state of a user, without taking a lock.
    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, LedgerError>;

    /// Insert the user if no row with its id exists.
    ///
    /// Returns `true` if the row was created. An existing row is left as is.
    async fn ensure_user(&self, user: &User) -> Result<bool, LedgerError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), LedgerError>;
}
