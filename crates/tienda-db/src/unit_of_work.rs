//! # Unit of Work
//!
//! One connection, one transaction, every write of one business operation.
//!
//! ```text
//! let mut uow = db.begin().await?;          BEGIN IMMEDIATE
//! uow.ledger().reserve("A", 2).await?;      UPDATE products ... version = ?
//! uow.orders().insert(&order).await?;       INSERT INTO orders / order_items
//! uow.carts().clear(&cart.id).await?;       DELETE FROM cart_items
//! uow.commit().await?;                      COMMIT
//!
//! Any `?` above drops `uow` → ROLLBACK. Nothing partial survives.
//! ```
//!
//! Stores handed out by the accessors borrow the unit of work mutably, so
//! the borrow checker keeps them from outliving it or from being used after
//! `commit` consumed it.
//!
//! ## Write Lock
//! Every unit of work writes, so it takes SQLite's write lock at BEGIN.
//! Competing units queue on `busy_timeout` and read fresh rows once they get
//! the lock. A unit that still cannot get the lock, or that trips a version
//! guard, fails with `Conflict`; [`retry_on_conflict`] re-runs the whole
//! operation from a fresh BEGIN a bounded number of times.

use std::future::Future;
use std::time::Duration;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::cart::CartStore;
use crate::repository::inventory::InventoryLedger;
use crate::repository::order::OrderStore;

/// Attempts per business operation before a `Conflict` reaches the caller.
pub const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// Pause before attempt `n + 1` is `n × CONFLICT_BACKOFF`.
const CONFLICT_BACKOFF: Duration = Duration::from_millis(25);

/// An open transaction scoped to one business operation.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Takes a pooled connection and the database write lock.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::transaction)?;
        debug!("Unit of work started");
        Ok(UnitOfWork { tx })
    }

    /// Stock reservations and restocks inside this transaction.
    pub fn ledger(&mut self) -> InventoryLedger<'_> {
        InventoryLedger::new(&mut self.tx)
    }

    /// Cart reads and writes inside this transaction.
    pub fn carts(&mut self) -> CartStore<'_> {
        CartStore::new(&mut self.tx)
    }

    /// Order reads and writes inside this transaction.
    pub fn orders(&mut self) -> OrderStore<'_> {
        OrderStore::new(&mut self.tx)
    }

    /// Makes every write of this unit of work durable at once.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await.map_err(DbError::transaction)?;
        debug!("Unit of work committed");
        Ok(())
    }
}

/// Runs `operation` again while it fails with [`DbError::Conflict`], up to
/// [`MAX_CONFLICT_ATTEMPTS`] runs in total.
///
/// `operation` must open its own unit of work on every call so each attempt
/// starts from a clean BEGIN and re-reads everything it depends on.
pub async fn retry_on_conflict<T, F, Fut>(label: &str, mut operation: F) -> DbResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(err) if err.is_conflict() && attempt < MAX_CONFLICT_ATTEMPTS => {
                warn!(operation = label, attempt, error = %err, "Conflict, retrying unit of work");
                tokio::time::sleep(CONFLICT_BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_stops_on_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_on_conflict("test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DbError::conflict("Product", "p-1"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: DbResult<()> = retry_on_conflict("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DbError::conflict("Product", "p-1"))
        })
        .await;

        assert!(result.unwrap_err().is_conflict());
        assert_eq!(counter.load(Ordering::SeqCst), MAX_CONFLICT_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: DbResult<()> = retry_on_conflict("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DbError::QueryFailed("boom".to_string()))
        })
        .await;

        assert!(matches!(result, Err(DbError::QueryFailed(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
