//! In-process ledger store.
//!
//! Every user row carries its own async lock. A unit of work takes row locks
//! as it reads rows for mutation and keeps them until it ends. Inserts,
//! balance updates and log appends are staged inside the unit of work and
//! applied together on commit, so readers only ever see committed state.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicI64, Ordering},
    },
};
use tokio::sync::OwnedMutexGuard;

use super::{LedgerStore, TransactionLog, UnitOfWork, UserStore};
use crate::{
    error::{LedgerError, StorageError, StorageStep},
    models::{LedgerTransaction, User, UserId},
};

struct Row {
    lock: Arc<tokio::sync::Mutex<()>>,
    balance: AtomicI64,
}

impl Row {
    fn new(balance: i64) -> Arc<Self> {
        Arc::new(Self {
            lock: Arc::new(tokio::sync::Mutex::new(())),
            balance: AtomicI64::new(balance),
        })
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, Arc<Row>>,
    transactions: Vec<LedgerTransaction>,
}

/// Ledger store held entirely in memory.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed log entries in append order.
    pub fn transactions(&self) -> Vec<LedgerTransaction> {
        lock_tables(&self.tables).transactions.clone()
    }

    /// Committed balances of every user.
    pub fn balances(&self) -> HashMap<UserId, i64> {
        lock_tables(&self.tables)
            .users
            .iter()
            .map(|(id, row)| (id.clone(), row.balance.load(Ordering::SeqCst)))
            .collect()
    }
}

fn lock_tables(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    // Tables are only mutated by infallible code, so a poisoned lock still
    // holds consistent data.
    tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, LedgerError> {
        Ok(Box::new(MemoryUnitOfWork {
            tables: Arc::clone(&self.tables),
            locked: HashMap::new(),
            inserted: Vec::new(),
            updates: HashMap::new(),
            appended: Vec::new(),
        }))
    }

    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, LedgerError> {
        let tables = lock_tables(&self.tables);
        Ok(tables.users.get(id).map(|row| User {
            id: id.clone(),
            balance: row.balance.load(Ordering::SeqCst),
        }))
    }

    async fn ensure_user(&self, user: &User) -> Result<bool, LedgerError> {
        let mut tables = lock_tables(&self.tables);
        if tables.users.contains_key(&user.id) {
            return Ok(false);
        }
        tables.users.insert(user.id.clone(), Row::new(user.balance));
        Ok(true)
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Staged changes plus the row locks held by one unit of work.
///
/// Dropping it releases the locks and discards everything staged.
pub struct MemoryUnitOfWork {
    tables: Arc<Mutex<Tables>>,
    locked: HashMap<UserId, (Arc<Row>, OwnedMutexGuard<()>)>,
    inserted: Vec<User>,
    updates: HashMap<UserId, i64>,
    appended: Vec<LedgerTransaction>,
}

impl MemoryUnitOfWork {
    /// State of a row as this unit of work sees it.
    fn staged_balance(&self, id: &UserId) -> Option<i64> {
        if let Some(balance) = self.updates.get(id) {
            return Some(*balance);
        }
        if let Some(user) = self.inserted.iter().find(|user| &user.id == id) {
            return Some(user.balance);
        }
        self.locked
            .get(id)
            .map(|(row, _)| row.balance.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl UserStore for MemoryUnitOfWork {
    async fn lock_user(&mut self, id: &UserId) -> Result<User, LedgerError> {
        if let Some(balance) = self.staged_balance(id) {
            return Ok(User {
                id: id.clone(),
                balance,
            });
        }

        let row = lock_tables(&self.tables)
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        let guard = Arc::clone(&row.lock).lock_owned().await;
        let balance = row.balance.load(Ordering::SeqCst);
        self.locked.insert(id.clone(), (row, guard));

        Ok(User {
            id: id.clone(),
            balance,
        })
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), LedgerError> {
        let exists = lock_tables(&self.tables).users.contains_key(&user.id)
            || self.inserted.iter().any(|staged| staged.id == user.id);
        if exists {
            return Err(StorageError::DuplicateUser(user.id.clone())).step("inserting user");
        }
        self.inserted.push(user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), LedgerError> {
        if let Some(staged) = self.inserted.iter_mut().find(|staged| staged.id == user.id) {
            staged.balance = user.balance;
            return Ok(());
        }
        if !self.locked.contains_key(&user.id) {
            self.lock_user(&user.id).await.map_err(|err| match err {
                LedgerError::NotFound(_) => LedgerError::Storage {
                    step: "updating user balance",
                    source: StorageError::RowCount(0),
                },
                other => other,
            })?;
        }
        self.updates.insert(user.id.clone(), user.balance);
        Ok(())
    }
}

#[async_trait]
impl TransactionLog for MemoryUnitOfWork {
    async fn append_transaction(&mut self, entry: &LedgerTransaction) -> Result<(), LedgerError> {
        self.appended.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let this = *self;
        let mut tables = lock_tables(&this.tables);

        if let Some(duplicate) = this
            .inserted
            .iter()
            .find(|user| tables.users.contains_key(&user.id))
        {
            return Err(StorageError::DuplicateUser(duplicate.id.clone()))
                .step("committing transaction");
        }

        for user in &this.inserted {
            tables.users.insert(user.id.clone(), Row::new(user.balance));
        }
        for (id, balance) in &this.updates {
            if let Some((row, _)) = this.locked.get(id) {
                row.balance.store(*balance, Ordering::SeqCst);
            }
        }
        tables.transactions.extend(this.appended.iter().cloned());

        // Row locks are released when `this` drops, after the tables guard.
        drop(tables);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        Ok(())
    }
}
