//! Ledger service - Core business logic for user seeding and transfers.
//!
//! This service handles:
//! - Atomic balance updates
//! - Transfer validation
//! - Deterministic row lock ordering
//! - Unit-of-work management and per-call deadlines
//!
//! # Atomicity Guarantees
//!
//! Every operation runs inside one unit of work. Log appends and balance
//! updates become visible only when the unit of work commits. A failure at
//! any step rolls everything back.
//!
//! # Lock Ordering
//!
//! Transfers lock the lexicographically smaller user id first. Two transfers
//! over the same pair of users therefore never deadlock, whichever direction
//! each one goes. Cycles across three or more users are not prevented by
//! this ordering alone.
//!
//! # Deadlines
//!
//! The per-call deadline covers opening the unit of work, lock waits and
//! every staged write. If it expires there, the unit of work is dropped and
//! rolled back, and the caller sees `Timeout` with nothing changed. Commit
//! and rollback run outside the deadline, so a `Timeout` is never reported
//! for a unit of work the store has committed.

use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    error::LedgerError,
    models::{LedgerTransaction, User, UserId},
    store::{LedgerStore, UnitOfWork},
};

/// Check a movement of `value` from `from` to `to` against their current balances.
///
/// # Rules
///
/// Checked in this order, the first failure wins:
///
/// 1. `from` and `to` must be different users → `SameAccount`
/// 2. `value` must not be negative → `NegativeValue`
/// 3. `from` must hold at least `value` → `InsufficientBalance`
/// 4. `to.balance + value` must fit in `i64` → `Overflow`
pub fn validate_transfer(from: &User, to: &User, value: i64) -> Result<(), LedgerError> {
    if from.id == to.id {
        return Err(LedgerError::SameAccount);
    }
    if value < 0 {
        return Err(LedgerError::NegativeValue);
    }
    if from.balance < value {
        return Err(LedgerError::InsufficientBalance(from.id.clone()));
    }
    if i64::MAX - value < to.balance {
        return Err(LedgerError::Overflow(to.id.clone()));
    }
    Ok(())
}

/// Orchestrates ledger operations over a storage backend.
///
/// The primary account id and the deadline are passed in explicitly.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    primary: UserId,
    timeout: Duration,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, primary: UserId, timeout: Duration) -> Self {
        Self {
            store,
            primary,
            timeout,
        }
    }

    pub fn primary(&self) -> &UserId {
        &self.primary
    }

    /// Create the primary account with `issuance` if it does not exist yet.
    ///
    /// An existing primary account keeps its balance.
    pub async fn ensure_primary(&self, issuance: i64) -> Result<(), LedgerError> {
        let created = self
            .within_deadline(self.store.ensure_user(&User {
                id: self.primary.clone(),
                balance: issuance,
            }))
            .await?;

        if created {
            info!(primary = %self.primary, issuance, "Primary account created");
        }
        Ok(())
    }

    /// Create a user funded by the primary account.
    ///
    /// # Process
    ///
    /// 1. Lock the primary account
    /// 2. Insert the new user with balance 0
    /// 3. Validate the seeding transfer against the primary's balance
    /// 4. Append the seeding transaction
    /// 5. Persist both balances
    /// 6. Commit (or rollback on error)
    ///
    /// # Errors
    ///
    /// - `NegativeValue`: `balance` is negative
    /// - `InsufficientBalance`: the primary account cannot fund `balance`
    /// - `NotFound`: the primary account does not exist
    /// - `Timeout`: the deadline expired before commit
    /// - `Storage`: the backend failed
    pub async fn create_user(&self, balance: i64) -> Result<User, LedgerError> {
        if balance < 0 {
            return Err(LedgerError::NegativeValue);
        }

        let (uow, outcome) = self
            .within_deadline(async {
                let mut uow = self.store.begin().await?;
                let outcome = self.seed_user(&mut *uow, balance).await;
                Ok((uow, outcome))
            })
            .await?;
        let user = finish(uow, outcome).await?;

        debug!(user_id = %user.id, balance, "User created");
        Ok(user)
    }

    /// Move `value` from one user to another.
    ///
    /// Returns the new balances of `from` and `to`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: either user does not exist
    /// - `SameAccount`, `NegativeValue`, `InsufficientBalance`, `Overflow`: validation failed
    /// - `Timeout`: the deadline expired before commit, including while waiting for a row lock
    /// - `Storage`: the backend failed
    pub async fn create_transfer(
        &self,
        from: &UserId,
        to: &UserId,
        value: i64,
    ) -> Result<(i64, i64), LedgerError> {
        let (uow, outcome) = self
            .within_deadline(async {
                let mut uow = self.store.begin().await?;
                let outcome = transfer(&mut *uow, from, to, value).await;
                Ok((uow, outcome))
            })
            .await?;
        let balances = finish(uow, outcome).await?;

        debug!(%from, %to, value, "Transfer committed");
        Ok(balances)
    }

    /// Latest committed state of a user.
    pub async fn get_user(&self, id: &UserId) -> Result<User, LedgerError> {
        self.within_deadline(self.store.fetch_user(id))
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    /// Check that storage is reachable.
    pub async fn ping(&self) -> Result<(), LedgerError> {
        self.within_deadline(self.store.ping()).await
    }

    async fn seed_user(&self, uow: &mut dyn UnitOfWork, balance: i64) -> Result<User, LedgerError> {
        let mut primary = uow.lock_user(&self.primary).await?;

        let mut user = User {
            id: UserId::generate(),
            balance: 0,
        };
        uow.insert_user(&user).await?;

        let entry = LedgerTransaction::new(primary.id.clone(), user.id.clone(), balance);
        validate_transfer(&primary, &user, entry.value)?;

        primary.balance -= entry.value;
        user.balance += entry.value;

        uow.append_transaction(&entry).await?;
        uow.update_user(&primary).await?;
        uow.update_user(&user).await?;

        Ok(user)
    }

    /// Bound `operation` by the configured deadline.
    ///
    /// On expiry the operation future is dropped, which drops any unit of
    /// work it opened and rolls it back.
    async fn within_deadline<T>(
        &self,
        operation: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| LedgerError::Timeout(self.timeout))?
    }
}

async fn transfer(
    uow: &mut dyn UnitOfWork,
    from: &UserId,
    to: &UserId,
    value: i64,
) -> Result<(i64, i64), LedgerError> {
    let (mut sender, mut receiver) = lock_pair(uow, from, to).await?;

    validate_transfer(&sender, &receiver, value)?;

    let entry = LedgerTransaction::new(sender.id.clone(), receiver.id.clone(), value);
    uow.append_transaction(&entry).await?;

    sender.balance -= value;
    receiver.balance += value;

    uow.update_user(&sender).await?;
    uow.update_user(&receiver).await?;

    Ok((sender.balance, receiver.balance))
}

/// Lock both users, smaller id first, and return them as `(from, to)`.
async fn lock_pair(
    uow: &mut dyn UnitOfWork,
    from: &UserId,
    to: &UserId,
) -> Result<(User, User), LedgerError> {
    if from == to {
        let user = uow.lock_user(from).await?;
        return Ok((user.clone(), user));
    }

    if from < to {
        let sender = uow.lock_user(from).await?;
        let receiver = uow.lock_user(to).await?;
        Ok((sender, receiver))
    } else {
        let receiver = uow.lock_user(to).await?;
        let sender = uow.lock_user(from).await?;
        Ok((sender, receiver))
    }
}

/// Commit on success, roll back on failure.
///
/// Rollback errors are logged and never replace the original error.
async fn finish<T>(
    uow: Box<dyn UnitOfWork>,
    outcome: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            debug!(error = %err, "Rolling back unit of work");
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
