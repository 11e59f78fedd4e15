//! # Inventory Ledger
//!
//! The single writer of `products.stock`.
//!
//! ## Versioned Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    reserve("MUG", 2)                                    │
//! │                                                                         │
//! │  SELECT stock, price_cents, name, version, is_active                    │
//! │       │   stock = 5, version = 7                                        │
//! │       ▼                                                                 │
//! │  stock >= 2 ?  ── no ──► InsufficientStock (nothing written)            │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock - 2, version = version + 1           │
//! │   WHERE id = 'MUG' AND version = 7                                      │
//! │       │                                                                 │
//! │       ├── 1 row  ──► Reservation { unit_price read at version 7 }       │
//! │       └── 0 rows ──► Conflict; the caller re-runs its unit of work      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit of work already holds the write lock, so the row read here is
//! the row the UPDATE sees. A version miss is reported, not retried here: a
//! re-read in the same transaction would see the same snapshot.
//!
//! The `CHECK (stock >= 0)` constraint backs the same invariant at the
//! storage level.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use tienda_core::validation::validate_quantity;
use tienda_core::{CoreError, Money, Reservation};

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    name: String,
    price_cents: i64,
    stock: i64,
    is_active: bool,
    version: i64,
}

/// Ledger operations on the connection of an enclosing unit of work.
#[derive(Debug)]
pub struct InventoryLedger<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> InventoryLedger<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        InventoryLedger { conn }
    }

    async fn read(&mut self, product_id: &str) -> DbResult<Option<LedgerRow>> {
        let row = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT name, price_cents, stock, is_active, version
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row)
    }

    /// Adds `delta` to stock if the row is still at `version`.
    async fn write_at_version(&mut self, product_id: &str, delta: i64, version: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock + ?1,
                version = version + 1,
                updated_at = ?2
            WHERE id = ?3 AND version = ?4
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(product_id)
        .bind(version)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            warn!(product_id = %product_id, expected_version = version, "Ledger version moved");
            Err(DbError::conflict("Product", product_id))
        }
    }

    /// Atomically takes `quantity` units of a product.
    ///
    /// ## Returns
    /// * `Ok(Reservation)` - stock decremented; carries the price and name
    ///   read at the same version that was written
    /// * `Err(Domain(ProductNotFound))` - unknown or inactive product
    /// * `Err(Domain(InsufficientStock))` - nothing written
    /// * `Err(Conflict)` - the row changed between read and write
    pub async fn reserve(&mut self, product_id: &str, quantity: i64) -> DbResult<Reservation> {
        validate_quantity(quantity)?;

        let row = self
            .read(product_id)
            .await?
            .filter(|row| row.is_active)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if row.stock < quantity {
            debug!(
                product_id = %product_id,
                available = row.stock,
                requested = quantity,
                "Insufficient stock"
            );
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available: row.stock,
                requested: quantity,
            }
            .into());
        }

        self.write_at_version(product_id, -quantity, row.version).await?;
        debug!(
            product_id = %product_id,
            quantity,
            remaining = row.stock - quantity,
            "Stock reserved"
        );

        Ok(Reservation {
            product_id: product_id.to_string(),
            product_name: row.name,
            quantity,
            unit_price: Money::from_cents(row.price_cents),
        })
    }

    /// Gives `quantity` units back to a product.
    ///
    /// Succeeds for any known product, active or not: goods coming back from
    /// a cancelled order exist regardless of catalog state.
    pub async fn restock(&mut self, product_id: &str, quantity: i64) -> DbResult<()> {
        if quantity <= 0 {
            return Err(tienda_core::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let row = self
            .read(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        self.write_at_version(product_id, quantity, row.version).await?;
        debug!(
            product_id = %product_id,
            quantity,
            stock = row.stock + quantity,
            "Stock restored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tienda_core::Product;

    async fn setup(stock: i64) -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = Product::new("Mug", Money::from_cents(1000), stock);
        db.products().insert(&product).await.unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_reserve_decrements_and_snapshots_price() {
        let (db, product) = setup(5).await;

        let mut uow = db.begin().await.unwrap();
        let reservation = uow.ledger().reserve(&product.id, 2).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(reservation.quantity, 2);
        assert_eq!(reservation.unit_price.cents(), 1000);
        assert_eq!(reservation.product_name, "Mug");

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
        assert_eq!(stored.version, product.version + 1);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_stock_writes_nothing() {
        let (db, product) = setup(1).await;

        let mut uow = db.begin().await.unwrap();
        let err = uow.ledger().reserve(&product.id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));
        drop(uow);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);
        assert_eq!(stored.version, product.version);
    }

    #[tokio::test]
    async fn test_reserve_unknown_or_inactive_product() {
        let (db, product) = setup(5).await;
        db.products().set_active(&product.id, false).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        let err = uow.ledger().reserve("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));

        let err = uow.ledger().reserve(&product.id, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_reserve_rejects_non_positive_quantity() {
        let (db, product) = setup(5).await;

        let mut uow = db.begin().await.unwrap();
        let err = uow.ledger().reserve(&product.id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_restock_after_reserve() {
        let (db, product) = setup(5).await;

        let mut uow = db.begin().await.unwrap();
        uow.ledger().reserve(&product.id, 3).await.unwrap();
        uow.ledger().restock(&product.id, 3).await.unwrap();
        uow.commit().await.unwrap();

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
        assert_eq!(stored.version, product.version + 2);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let (db, product) = setup(5).await;

        {
            let mut uow = db.begin().await.unwrap();
            uow.ledger().reserve(&product.id, 5).await.unwrap();
            // dropped without commit
        }

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
    }
}
