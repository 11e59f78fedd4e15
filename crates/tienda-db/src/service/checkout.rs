//! # Checkout
//!
//! Converts a user's cart into a Pending order.
//!
//! ## Flow (one unit of work)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE                                                        │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  load cart ── no lines ──► EmptyCart                                    │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  for line in lines sorted by product_id:                                │
//! │      ledger.reserve(line) ── InsufficientStock / Conflict ──► ROLLBACK  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  Order::from_reservations (snapshot prices, total = Σ lines)            │
//! │  orders.insert(order)                                                   │
//! │  carts.clear(cart)                                                      │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are reserved in a fixed order so two checkouts touching the same
//! products always contend in the same sequence. A checkout that cannot get
//! the write lock in time is re-run from BEGIN, up to
//! [`MAX_CONFLICT_ATTEMPTS`](crate::MAX_CONFLICT_ATTEMPTS) times.

use tracing::{error, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::unit_of_work::retry_on_conflict;
use tienda_core::{CoreError, Order};

/// Checkout orchestrator.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Checks out `user_id`'s cart.
    ///
    /// ## Returns
    /// * `Ok(Order)` - Pending order; stock reserved, cart emptied
    /// * `Err(Domain(EmptyCart))` - nothing to check out
    /// * `Err(Domain(InsufficientStock))` - a line could not be covered;
    ///   nothing was written
    /// * `Err(Conflict)` - lost a race after retries; the caller may retry
    pub async fn checkout(&self, user_id: &str) -> DbResult<Order> {
        match retry_on_conflict("checkout", move || self.run(user_id)).await {
            Ok(order) => {
                info!(
                    order_id = %order.id,
                    user_id = %user_id,
                    items = order.items.len(),
                    total = %order.total(),
                    "Checkout complete"
                );
                Ok(order)
            }
            Err(err @ DbError::Conflict { .. }) => {
                warn!(user_id = %user_id, error = %err, "Checkout lost a concurrency race");
                Err(err)
            }
            Err(err) if err.is_storage_failure() => {
                error!(user_id = %user_id, error = %err, "Checkout failed in storage");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn run(&self, user_id: &str) -> DbResult<Order> {
        let mut uow = self.db.begin().await?;

        let cart = uow
            .carts()
            .load(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(CoreError::EmptyCart)?;

        let mut lines = cart.lines.clone();
        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        let mut reservations = Vec::with_capacity(lines.len());
        for line in &lines {
            let reservation = uow.ledger().reserve(&line.product_id, line.quantity).await?;
            reservations.push(reservation);
        }

        let order = Order::from_reservations(user_id, reservations);

        uow.orders().insert(&order).await?;
        uow.carts().clear(&cart.id).await?;
        uow.commit().await?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use std::time::Duration;
    use tempfile::TempDir;
    use tienda_core::{Money, OrderStatus, Product};

    async fn product(db: &Database, id: &str, cents: i64, stock: i64) {
        let mut product = Product::new(format!("Product {id}"), Money::from_cents(cents), stock);
        product.id = id.to_string();
        db.products().insert(&product).await.unwrap();
    }

    async fn stock(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    /// A WAL file store with a real pool, so units of work overlap.
    async fn file_store(dir: &TempDir, busy_timeout: Duration) -> Database {
        let config = DbConfig::new(dir.path().join("tienda.db"))
            .max_connections(8)
            .busy_timeout(busy_timeout);
        Database::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_checkout_two_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        product(&db, "A", 1000, 5).await;
        product(&db, "B", 500, 5).await;

        // Added out of order on purpose
        db.carts().add_item("u-1", "B", 1).await.unwrap();
        db.carts().add_item("u-1", "A", 2).await.unwrap();

        let order = CheckoutService::new(db.clone()).checkout("u-1").await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total().to_decimal_string(), "25.00");
        let lines: Vec<_> = order
            .items
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity, i.unit_price_cents))
            .collect();
        assert_eq!(lines, vec![("A", 2, 1000), ("B", 1, 500)]);

        assert_eq!(stock(&db, "A").await, 3);
        assert_eq!(stock(&db, "B").await, 4);
        assert!(db.carts().get("u-1").await.unwrap().unwrap().is_empty());

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 2500);
        assert_eq!(stored.items.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = CheckoutService::new(db.clone());

        // No cart at all
        let err = service.checkout("u-1").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));

        // Cart exists but was emptied by a previous checkout
        product(&db, "A", 100, 1).await;
        db.carts().add_item("u-1", "A", 1).await.unwrap();
        service.checkout("u-1").await.unwrap();
        let err = service.checkout("u-1").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        product(&db, "A", 1000, 5).await;
        product(&db, "B", 500, 1).await;
        db.carts().add_item("u-1", "A", 2).await.unwrap();
        db.carts().add_item("u-1", "B", 3).await.unwrap();

        let err = CheckoutService::new(db.clone()).checkout("u-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { ref product_id, .. }) if product_id == "B"
        ));

        // A was reserved before B failed; the rollback undid it
        assert_eq!(stock(&db, "A").await, 5);
        assert_eq!(stock(&db, "B").await, 1);
        assert_eq!(db.carts().get("u-1").await.unwrap().unwrap().lines.len(), 2);
        assert!(db.orders().list_for_user("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_keeps_snapshot_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        product(&db, "A", 1000, 5).await;
        db.carts().add_item("u-1", "A", 2).await.unwrap();

        let order = CheckoutService::new(db.clone()).checkout("u-1").await.unwrap();
        db.products().set_price("A", 9999).await.unwrap();

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].unit_price_cents, 1000);
        assert_eq!(stored.total_cents, 2000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_on_last_unit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        product(&db, "C", 700, 1).await;
        db.carts().add_item("u-1", "C", 1).await.unwrap();
        db.carts().add_item("u-2", "C", 1).await.unwrap();

        let first = tokio::spawn({
            let service = CheckoutService::new(db.clone());
            async move { service.checkout("u-1").await }
        });
        let second = tokio::spawn({
            let service = CheckoutService::new(db.clone());
            async move { service.checkout("u-2").await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        for result in &results {
            if let Err(err) = result {
                assert!(
                    err.is_conflict()
                        || matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })),
                    "unexpected error: {err:?}"
                );
            }
        }

        assert_eq!(stock(&db, "C").await, 0);
        assert_eq!(db.orders().list_all(None).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_store(&dir, Duration::from_secs(5)).await;
        let initial = 3;
        product(&db, "C", 700, initial).await;

        let users: Vec<String> = (0..10).map(|i| format!("u-{i}")).collect();
        for user in &users {
            db.carts().add_item(user, "C", 1).await.unwrap();
        }

        let handles: Vec<_> = users
            .iter()
            .cloned()
            .map(|user| {
                let service = CheckoutService::new(db.clone());
                tokio::spawn(async move { service.checkout(&user).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(order) => {
                    assert_eq!(order.items[0].quantity, 1);
                    succeeded += 1;
                }
                Err(err) => {
                    assert!(!err.is_storage_failure(), "storage failure: {err:?}");
                    assert!(
                        err.is_conflict()
                            || matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })),
                        "unexpected error: {err:?}"
                    );
                }
            }
        }

        let remaining = stock(&db, "C").await;
        assert!(remaining >= 0);
        assert_eq!(succeeded + remaining, initial);
        assert_eq!(db.orders().list_all(None).await.unwrap().len() as i64, succeeded);
        // Writers queue on busy_timeout, so every unit goes to a buyer
        assert_eq!(remaining, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_checkout_retries_after_lock_is_released() {
        let dir = tempfile::tempdir().unwrap();
        // No lock wait at all: every blocked BEGIN fails straight into Conflict
        let db = file_store(&dir, Duration::ZERO).await;
        product(&db, "C", 700, 2).await;
        db.carts().add_item("u-1", "C", 1).await.unwrap();

        let writer = db.begin().await.unwrap();
        let checkout = tokio::spawn({
            let service = CheckoutService::new(db.clone());
            async move { service.checkout("u-1").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        writer.commit().await.unwrap();

        let order = checkout.await.unwrap().unwrap();
        assert_eq!(order.total_cents, 700);
        assert_eq!(stock(&db, "C").await, 1);
    }

    #[tokio::test]
    async fn test_checkout_gives_up_while_lock_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_store(&dir, Duration::ZERO).await;
        product(&db, "C", 700, 2).await;
        db.carts().add_item("u-1", "C", 1).await.unwrap();

        let writer = db.begin().await.unwrap();
        let err = CheckoutService::new(db.clone()).checkout("u-1").await.unwrap_err();
        assert!(err.is_conflict(), "unexpected error: {err:?}");
        drop(writer);

        assert_eq!(stock(&db, "C").await, 2);
        assert_eq!(db.carts().get("u-1").await.unwrap().unwrap().lines.len(), 1);
        assert!(db.orders().list_for_user("u-1").await.unwrap().is_empty());
    }
}
