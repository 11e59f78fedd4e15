//! # Domain Types
//!
//! Core records used throughout Tienda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Cart       │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  price_cents    │   │  user_id        │   │  user_id        │       │
//! │  │  stock          │   │  lines[]        │   │  status         │       │
//! │  │  version        │   │                 │   │  total_cents    │       │
//! │  └────────┬────────┘   └────────┬────────┘   │  items[]        │       │
//! │           │ reserve()           │ checkout   └────────▲────────┘       │
//! │           ▼                     ▼                     │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐            │                 │
//! │  │  Reservation    │──►│   OrderItem     │────────────┘                 │
//! │  │ (price snapshot)│   │ (immutable)     │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! An order line copies the product name and unit price at the instant
//! stock was reserved. Later catalog price changes never touch it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product as seen by the inventory ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,

    /// Display name, snapshotted into order lines.
    pub name: String,

    /// Current catalog price in cents.
    pub price_cents: i64,

    /// Available stock. Never negative.
    pub stock: i64,

    /// Inactive products cannot be added to carts.
    pub is_active: bool,

    /// Version token, incremented on every ledger write.
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new active product with a fresh id.
    pub fn new(name: impl Into<String>, price: Money, stock: i64) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price_cents: price.cents(),
            stock,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

}

// =============================================================================
// Cart
// =============================================================================

/// A user's staging area. One per user, created lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Lines, joined with live product data for display.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Cart subtotal at live catalog prices (display only, never charged).
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One product line of a cart.
///
/// `unit_price_cents` is the *live* price. Checkout re-reads the price from
/// the ledger at reservation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl CartLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order. Closed set; transitions live in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    /// Created by checkout, stock already deducted.
    #[default]
    Pending,
    /// Payment captured.
    Paid,
    /// Handed to the carrier. Terminal.
    Shipped,
    /// Abandoned or payment failed; stock returned. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Cancelled,
    ];

    /// Storage representation (matches the sqlx `rename_all`).
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Case-insensitive parse, used for the `?status=` filter.
impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_db_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown order status '{}'", s),
            })
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// The result of a successful ledger reservation.
///
/// Price and name are read at the same instant the stock was decremented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

// =============================================================================
// Order
// =============================================================================

/// An order. Items and total are frozen at creation; only `status` moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Builds a Pending order from the reservations of one checkout.
    ///
    /// One item per reservation, in reservation order. The total is the sum
    /// of the line totals, so the two can never disagree.
    pub fn from_reservations(user_id: impl Into<String>, reservations: Vec<Reservation>) -> Self {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let items: Vec<OrderItem> = reservations
            .into_iter()
            .enumerate()
            .map(|(position, r)| OrderItem::snapshot(&id, position as i64, r))
            .collect();

        let total: Money = items.iter().map(OrderItem::line_total).sum();

        Order {
            id,
            user_id: user_id.into(),
            status: OrderStatus::Pending,
            total_cents: total.cents(),
            created_at: now,
            updated_at: now,
            items,
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Recomputes Σ line totals from the items.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A frozen order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Position within the order (reservation order).
    pub position: i64,
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of checkout (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl OrderItem {
    fn snapshot(order_id: &str, position: i64, reservation: Reservation) -> Self {
        let line_total = reservation.unit_price.multiply_quantity(reservation.quantity);
        OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            position,
            product_id: reservation.product_id,
            name_snapshot: reservation.product_name,
            unit_price_cents: reservation.unit_price.cents(),
            quantity: reservation.quantity,
            line_total_cents: line_total.cents(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
