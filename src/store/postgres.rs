//! PostgreSQL ledger store.
//!
//! Each unit of work is one database transaction at READ COMMITTED.
//! User rows read for mutation are locked with `FOR NO KEY UPDATE`, which
//! blocks concurrent writers of the row without blocking inserts into
//! `transactions` that reference it.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use super::{LedgerStore, TransactionLog, UnitOfWork, UserStore};
use crate::{
    db::DbPool,
    error::{LedgerError, StorageError, StorageStep},
    models::{LedgerTransaction, User, UserId},
};

/// Ledger store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: DbPool,
}

impl PgLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        let mut tx = self.pool.begin().await.step("beginning transaction")?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await
            .step("setting isolation level")?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, LedgerError> {
        sqlx::query_as::<_, User>("SELECT id, balance FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .step("fetching user")
    }

    async fn ensure_user(&self, user: &User) -> Result<bool, LedgerError> {
        let inserted = sqlx::query(
            "INSERT INTO users (id, balance) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
        )
        .bind(&user.id)
        .bind(user.balance)
        .execute(&self.pool)
        .await
        .step("ensuring user")?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .step("pinging database")?;
        Ok(())
    }
}

/// An open database transaction.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UserStore for PgUnitOfWork {
    async fn lock_user(&mut self, id: &UserId) -> Result<User, LedgerError> {
        sqlx::query_as::<_, User>("SELECT id, balance FROM users WHERE id = $1 FOR NO KEY UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .step("locking user")?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), LedgerError> {
        sqlx::query("INSERT INTO users (id, balance) VALUES ($1, $2)")
            .bind(&user.id)
            .bind(user.balance)
            .execute(&mut *self.tx)
            .await
            .step("inserting user")?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), LedgerError> {
        let affected = sqlx::query("UPDATE users SET balance = $1 WHERE id = $2")
            .bind(user.balance)
            .bind(&user.id)
            .execute(&mut *self.tx)
            .await
            .step("updating user balance")?
            .rows_affected();

        if affected != 1 {
            return Err(StorageError::RowCount(affected)).step("updating user balance");
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionLog for PgUnitOfWork {
    async fn append_transaction(&mut self, entry: &LedgerTransaction) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, from_id, to_id, value, "timestamp")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.from_id)
        .bind(&entry.to_id)
        .bind(entry.value)
        .bind(entry.timestamp)
        .execute(&mut *self.tx)
        .await
        .step("appending transaction")?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await.step("committing transaction")
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.rollback().await.step("rolling back transaction")
    }
}
