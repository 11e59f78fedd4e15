//! # Business Outcomes
//!
//! Everything here is an expected result a caller reacts to, never a
//! fault. Storage faults and lost races belong to `tienda-db`.
//!
//! ```text
//! ValidationError ─► CoreError ─► DbError::Domain ─► ApiError (400/404)
//! ```

use thiserror::Error;

use crate::lifecycle::OrderEvent;
use crate::types::OrderStatus;

/// Business rule violations surfaced directly to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist or is no longer active.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Checkout was requested on a cart without lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds what the ledger holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (cart: MUG × 5)
    ///      │
    ///      ▼
    /// reserve(MUG, 5): stock = 3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "MUG", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole checkout rolled back, client sees 400 InsufficientStock:MUG
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The order's current status does not accept the event.
    #[error("Order {order_id} is {from}, cannot {event}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        event: OrderEvent,
    },

    /// Too many distinct products in one cart.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A merged cart line would exceed the per-line maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Attaches the order id to a transition rejection from the pure state machine.
    pub fn invalid_transition(
        order_id: impl Into<String>,
        from: OrderStatus,
        event: OrderEvent,
    ) -> Self {
        CoreError::InvalidTransition {
            order_id: order_id.into(),
            from,
            event,
        }
    }
}

/// Malformed input, raised before any unit of work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// e.g. an unknown status name in a filter
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}
