//! # Product Repository
//!
//! Catalog maintenance for products: insert, lookup, price and activation
//! changes. Stock is never written here; it belongs to the
//! [`InventoryLedger`](crate::repository::inventory::InventoryLedger).
//!
//! Every write bumps `version`, so a ledger reservation that read the old
//! price retries and snapshots the new one instead.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tienda_core::validation::{validate_price_cents, validate_product_name, validate_stock};
use tienda_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, stock, is_active, version, created_at, updated_at";

/// Repository for product catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// repo.insert(&Product::new("Mug", Money::from_cents(1000), 5)).await?;
/// let mugs = repo.list_active(20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Validates and inserts a catalog entry. A reused id is a `Constraint`
    /// error.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        validate_stock(product.stock)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, stock,
                is_active, version, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.version)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Changes the catalog price. Existing orders keep their snapshot.
    pub async fn set_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        validate_price_cents(price_cents)?;
        debug!(id = %id, price_cents, "Updating product price");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                price_cents = ?2,
                version = version + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Activates or retires a product.
    ///
    /// Retired products can't be added to carts or reserved, but orders that
    /// already hold them can still be cancelled and restocked.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Updating product activation");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_active = ?2,
                version = version + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
