//! # tienda-core: Pure Business Logic for Tienda
//!
//! This crate holds the order checkout and fulfillment rules as pure
//! functions and plain data. Nothing here touches a database or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tienda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum HTTP)                         │   │
//! │  │   POST /orders/checkout ── /pay ── /cancel ── /ship             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            tienda-db (ledger, checkout, lifecycle)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tienda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ lifecycle │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Status   │  │   rules   │  │   │
//! │  │   │   Order   │  │           │  │  Events   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Cart, Order, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`lifecycle`] - Order status transitions and their side effects
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tienda_core::lifecycle::OrderEvent;
//! use tienda_core::{Money, OrderStatus};
//!
//! let line = Money::from_cents(1000).multiply_quantity(2);
//! assert_eq!(line.to_decimal_string(), "20.00");
//!
//! let transition = OrderStatus::Pending.apply(OrderEvent::Cancel).unwrap();
//! assert_eq!(transition.to, OrderStatus::Cancelled);
//! assert!(transition.restock);
//! ```

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;

// These allow users to do `use tienda_core::Money` instead of
// `use tienda_core::money::Money`
pub use error::{CoreError, ValidationError};
pub use lifecycle::{OrderEvent, Rejected, Transition};
pub use money::Money;
pub use types::*;

/// Maximum distinct products allowed in a single cart.
///
/// Prevents runaway carts and keeps a checkout's unit of work small.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product per cart line.
pub const MAX_ITEM_QUANTITY: i64 = 999;
