//! # Order Lifecycle
//!
//! The order state machine. Every legal status change, and whether it gives
//! stock back to the ledger, is decided here and nowhere else.
//!
//! ```text
//!                 PaymentApproved            Ship
//!   ┌─────────┐ ─────────────────► ┌──────┐ ──────► ┌─────────┐
//!   │ Pending │                    │ Paid │         │ Shipped │
//!   └─────────┘                    └──────┘         └─────────┘
//!        │  PaymentDeclined / Cancel    │
//!        │  AdminCancel                 │ AdminCancel
//!        ▼         (restock)            ▼  (restock)
//!   ┌───────────────────────────────────────┐
//!   │               Cancelled               │
//!   └───────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::OrderStatus;

/// Something that happens to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    /// Gateway captured the payment.
    PaymentApproved,
    /// Gateway refused the payment. A normal outcome, not a fault.
    PaymentDeclined,
    /// Customer-facing cancel.
    Cancel,
    /// Carrier hand-off.
    Ship,
    /// Privileged cancel. Broader than [`OrderEvent::Cancel`]: also accepted
    /// from `Paid`. Never accepted from `Shipped`, which would need a returns
    /// flow to put goods back on the shelf.
    AdminCancel,
}

impl OrderEvent {
    /// Verb used in error messages.
    pub const fn verb(&self) -> &'static str {
        match self {
            OrderEvent::PaymentApproved | OrderEvent::PaymentDeclined => "pay",
            OrderEvent::Cancel => "cancel",
            OrderEvent::Ship => "ship",
            OrderEvent::AdminCancel => "cancel (admin)",
        }
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A legal status change and the side effect it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Every order line's quantity goes back to the ledger.
    pub restock: bool,
}

/// Rejected event; the caller attaches the order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    pub from: OrderStatus,
    pub event: OrderEvent,
}

impl Rejected {
    /// Attaches the order id, producing the caller-facing error.
    pub fn for_order(self, order_id: impl Into<String>) -> CoreError {
        CoreError::invalid_transition(order_id, self.from, self.event)
    }
}

impl OrderStatus {
    /// Applies `event` to this status.
    ///
    /// | From | Event | To | Restock |
    /// |---|---|---|---|
    /// | Pending | PaymentApproved | Paid | no |
    /// | Pending | PaymentDeclined | Cancelled | yes |
    /// | Pending | Cancel | Cancelled | yes |
    /// | Pending, Paid | AdminCancel | Cancelled | yes |
    /// | Paid | Ship | Shipped | no |
    ///
    /// Anything else is rejected.
    pub fn apply(self, event: OrderEvent) -> Result<Transition, Rejected> {
        use OrderEvent::*;
        use OrderStatus::*;

        let (to, restock) = match (self, event) {
            (Pending, PaymentApproved) => (Paid, false),
            (Pending, PaymentDeclined) => (Cancelled, true),
            (Pending, Cancel) => (Cancelled, true),
            (Pending | Paid, AdminCancel) => (Cancelled, true),
            (Paid, Ship) => (Shipped, false),
            _ => return Err(Rejected { from: self, event }),
        };

        Ok(Transition {
            from: self,
            to,
            restock,
        })
    }
}
