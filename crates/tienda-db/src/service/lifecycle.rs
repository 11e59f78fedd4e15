//! # Order Lifecycle Service
//!
//! Applies [`OrderEvent`]s to stored orders.
//!
//! Every transition is one unit of work:
//! 1. re-read the order inside the transaction
//! 2. ask [`OrderStatus::apply`](tienda_core::OrderStatus::apply) whether the event is legal
//! 3. guarded status write (`... WHERE status = <from>`)
//! 4. restock every item if the transition says so
//! 5. commit
//!
//! The guarded write turns a lost race into `Conflict` before any restock
//! runs, so two concurrent cancels can never give stock back twice. A
//! conflicting unit is re-run from the re-read, where the event usually
//! turns out to be no longer legal.
//!
//! A charge approved by the gateway whose transition then fails is logged
//! with the gateway reference: money was taken for an order that did not
//! become Paid.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::DbResult;
use crate::pool::Database;
use crate::unit_of_work::retry_on_conflict;
use crate::service::payment::{PaymentGateway, PaymentOutcome};
use tienda_core::{CoreError, Order, OrderEvent};

/// Outcome of a payment attempt. A decline is not an error: the order has
/// been cancelled and restocked, and the caller reports a failed payment.
#[derive(Debug, Clone)]
pub enum PaymentResult {
    Captured { order: Order, reference: String },
    Declined { order: Order, reason: String },
}

impl PaymentResult {
    pub fn order(&self) -> &Order {
        match self {
            PaymentResult::Captured { order, .. } | PaymentResult::Declined { order, .. } => order,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, PaymentResult::Captured { .. })
    }
}

/// Pay, cancel, ship and privileged cancel.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>) -> Self {
        OrderService { db, gateway }
    }

    /// Loads an order or fails with `OrderNotFound`.
    pub async fn get(&self, order_id: &str) -> DbResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Charges a Pending order.
    ///
    /// The gateway is only consulted once the order is known to be Pending.
    /// Approval moves it to Paid; decline cancels it and restocks.
    pub async fn pay(&self, order_id: &str) -> DbResult<PaymentResult> {
        let order = self.get(order_id).await?;
        order
            .status
            .apply(OrderEvent::PaymentApproved)
            .map_err(|rejected| rejected.for_order(order_id))?;

        match self.gateway.charge(&order).await {
            PaymentOutcome::Approved { reference } => {
                let order = match self.transition(order_id, OrderEvent::PaymentApproved).await {
                    Ok(order) => order,
                    Err(err) => {
                        error!(
                            order_id = %order_id,
                            reference = %reference,
                            error = %err,
                            "Payment captured but order was not marked Paid, refund required"
                        );
                        return Err(err);
                    }
                };
                info!(order_id = %order_id, total = %order.total(), reference = %reference, "Payment captured");
                Ok(PaymentResult::Captured { order, reference })
            }
            PaymentOutcome::Declined { reason } => {
                let order = self.transition(order_id, OrderEvent::PaymentDeclined).await?;
                warn!(order_id = %order_id, reason = %reason, "Payment declined, order cancelled");
                Ok(PaymentResult::Declined { order, reason })
            }
        }
    }

    /// Customer cancel of a Pending order; restocks every item.
    pub async fn cancel(&self, order_id: &str) -> DbResult<Order> {
        let order = self.transition(order_id, OrderEvent::Cancel).await?;
        info!(order_id = %order_id, "Order cancelled");
        Ok(order)
    }

    /// Hands a Paid order to the carrier.
    pub async fn ship(&self, order_id: &str) -> DbResult<Order> {
        let order = self.transition(order_id, OrderEvent::Ship).await?;
        info!(order_id = %order_id, "Order shipped");
        Ok(order)
    }

    /// Privileged cancel of a Pending or Paid order; restocks every item.
    pub async fn admin_cancel(&self, order_id: &str) -> DbResult<Order> {
        let order = self.transition(order_id, OrderEvent::AdminCancel).await?;
        info!(order_id = %order_id, "Order cancelled by admin");
        Ok(order)
    }

    async fn transition(&self, order_id: &str, event: OrderEvent) -> DbResult<Order> {
        retry_on_conflict("order_transition", move || self.transition_once(order_id, event)).await
    }

    async fn transition_once(&self, order_id: &str, event: OrderEvent) -> DbResult<Order> {
        let mut uow = self.db.begin().await?;

        let mut order = uow
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        let transition = order
            .status
            .apply(event)
            .map_err(|rejected| rejected.for_order(order_id))?;

        let updated_at = uow
            .orders()
            .update_status(order_id, transition.from, transition.to)
            .await?;

        if transition.restock {
            for item in &order.items {
                uow.ledger().restock(&item.product_id, item.quantity).await?;
            }
        }

        uow.commit().await?;

        order.status = transition.to;
        order.updated_at = updated_at;
        Ok(order)
    }
}
