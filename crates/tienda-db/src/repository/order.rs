//! # Order Repository
//!
//! Orders and their frozen items.
//!
//! ## Read vs Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderRepository (pool)            OrderStore<'c> (unit of work)        │
//! │  ──────────────────────            ─────────────────────────────        │
//! │  get_by_id                         get_by_id                            │
//! │  list_for_user (newest first)      insert (order + items)               │
//! │  list_all(status?)                 update_status (guarded)              │
//! │                                                                         │
//! │  Writes only exist on the store, so they only happen inside a unit of   │
//! │  work held by checkout or the lifecycle service.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tienda_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.status, o.total_cents, o.created_at, o.updated_at";
const ITEM_COLUMNS: &str = "oi.id, oi.order_id, oi.position, oi.product_id, oi.name_snapshot, \
     oi.unit_price_cents, oi.quantity, oi.line_total_cents";

/// Pool-backed order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// The user's orders, newest first, each with items.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            WHERE o.user_id = ?1
            ORDER BY o.created_at DESC, o.rowid DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM order_items oi
            INNER JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ?1
            ORDER BY oi.order_id, oi.position
            "#
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        debug!(user_id = %user_id, count = orders.len(), "Listed user orders");
        Ok(attach_items(orders, items))
    }

    /// Every order, newest first, optionally filtered by status.
    pub async fn list_all(&self, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            WHERE ?1 IS NULL OR o.status = ?1
            ORDER BY o.created_at DESC, o.rowid DESC
            "#
        ))
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM order_items oi
            INNER JOIN orders o ON o.id = oi.order_id
            WHERE ?1 IS NULL OR o.status = ?1
            ORDER BY oi.order_id, oi.position
            "#
        ))
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;

        debug!(status = ?status, count = orders.len(), "Listed all orders");
        Ok(attach_items(orders, items))
    }
}

/// Order reads and writes on the connection of an enclosing unit of work.
#[derive(Debug)]
pub struct OrderStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OrderStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        OrderStore { conn }
    }

    /// Gets an order with its items, as seen by this transaction.
    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Order>> {
        fetch_order(&mut *self.conn, id).await
    }

    /// Inserts an order and all of its items.
    pub async fn insert(&mut self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, items = order.items.len(), total_cents = order.total_cents, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.conn)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, product_id, name_snapshot,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5,
                    ?6, ?7, ?8
                )
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(item.position)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .execute(&mut *self.conn)
            .await?;
        }

        Ok(())
    }

    /// Moves an order from `from` to `to`, only if it is still in `from`.
    /// Returns the `updated_at` it wrote.
    ///
    /// Zero rows affected means another unit of work moved the order first;
    /// that is reported as [`DbError::Conflict`] so the loser never applies
    /// the transition's side effects a second time.
    pub async fn update_status(
        &mut self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<DateTime<Utc>> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Order", id));
        }

        debug!(id = %id, from = %from, to = %to, "Order status updated");
        Ok(now)
    }
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut order) = order else {
        return Ok(None);
    };

    order.items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items oi WHERE oi.order_id = ?1 ORDER BY oi.position"
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(order))
}

fn attach_items(mut orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<Order> {
    let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id.clone()).or_default().push(item);
    }

    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }

    orders
}
