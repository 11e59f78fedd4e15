//! # Cart Repository
//!
//! One cart per user, created lazily on the first add.
//!
//! ```text
//! addItem(user, MUG, 2)              cart_items
//!   │                                ┌──────────┬────────────┬──────────┐
//!   ├── product active?              │ cart_id  │ product_id │ quantity │
//!   ├── cart exists? else INSERT     ├──────────┼────────────┼──────────┤
//!   └── UPSERT line ───────────────► │ c-1      │ MUG        │ 2 (+2)   │
//!                                    └──────────┴────────────┴──────────┘
//! ```
//!
//! Adding never checks stock; availability is decided by the ledger at
//! checkout.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::unit_of_work::{retry_on_conflict, UnitOfWork};
use tienda_core::validation::{validate_id, validate_quantity};
use tienda_core::{Cart, CartLine, CoreError, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Pool-backed cart operations used directly by the HTTP layer.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// The user's cart with lines at live prices, or `None` if the user has
    /// never added anything.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let mut conn = self.pool.acquire().await?;
        CartStore::new(&mut conn).load(user_id).await
    }

    /// Adds `quantity` of a product to the user's cart in its own unit of
    /// work, returning the updated cart.
    pub async fn add_item(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<Cart> {
        validate_id("productId", product_id)?;
        validate_quantity(quantity)?;

        let pool = &self.pool;
        let cart = retry_on_conflict("add_to_cart", move || async move {
            let mut uow = UnitOfWork::begin(pool).await?;
            let cart = uow.carts().add_item(user_id, product_id, quantity).await?;
            uow.commit().await?;
            Ok(cart)
        })
        .await?;

        info!(user_id = %user_id, product_id = %product_id, quantity, "Item added to cart");
        Ok(cart)
    }
}

/// Cart operations on the connection of an enclosing unit of work.
#[derive(Debug)]
pub struct CartStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CartStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CartStore { conn }
    }

    /// Loads the cart and its lines, ordered by product id.
    pub async fn load(&mut self, user_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(mut cart) = cart else {
            return Ok(None);
        };

        cart.lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT
                ci.product_id,
                p.name AS product_name,
                ci.quantity,
                p.price_cents AS unit_price_cents
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.product_id
            "#,
        )
        .bind(&cart.id)
        .fetch_all(&mut *self.conn)
        .await?;

        debug!(user_id = %user_id, lines = cart.lines.len(), "Cart loaded");
        Ok(Some(cart))
    }

    /// Upserts a line, creating the cart if needed.
    ///
    /// ## Errors
    /// * `ProductNotFound` - unknown or inactive product
    /// * `QuantityTooLarge` - the merged line would exceed `MAX_ITEM_QUANTITY`
    /// * `CartTooLarge` - a new line would exceed `MAX_CART_ITEMS`
    pub async fn add_item(&mut self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<Cart> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *self.conn)
                .await?;

        if active != Some(true) {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let cart_id = self.ensure_cart(user_id).await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM cart_items WHERE cart_id = ?1 AND product_id = ?2",
        )
        .bind(&cart_id)
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        match existing {
            Some(current) if current + quantity > MAX_ITEM_QUANTITY => {
                return Err(CoreError::QuantityTooLarge {
                    requested: current + quantity,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            Some(_) => {}
            None => {
                let lines: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
                        .bind(&cart_id)
                        .fetch_one(&mut *self.conn)
                        .await?;

                if lines as usize >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    }
                    .into());
                }
            }
        }

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, added_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(&cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(&cart_id)
            .bind(now)
            .execute(&mut *self.conn)
            .await?;

        self.load(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", user_id))
    }

    async fn ensure_cart(&mut self, user_id: &str) -> DbResult<String> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&mut *self.conn)
                .await?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(user_id = %user_id, cart_id = %id, "Creating cart");

        sqlx::query(
            "INSERT INTO carts (id, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        Ok(id)
    }

    /// Deletes every line of the cart. The cart row itself stays.
    pub async fn clear(&mut self, cart_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *self.conn)
            .await?;

        debug!(cart_id = %cart_id, removed = result.rows_affected(), "Cart cleared");
        Ok(())
    }
}
