//! # Payment Gateway Seam
//!
//! The lifecycle service asks a [`PaymentGateway`] whether an order's total
//! can be captured. Only a simulated gateway ships; a real processor plugs
//! in behind the same trait.
//!
//! A decline is an ordinary [`PaymentOutcome`], never an `Err`.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use tienda_core::{Money, Order};

/// What the gateway decided for one charge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Funds captured; `reference` identifies the capture at the processor.
    Approved { reference: String },
    /// Charge refused.
    Declined { reason: String },
}

impl PaymentOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentOutcome::Approved { .. })
    }
}

/// A payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempts to capture `order.total()`.
    async fn charge(&self, order: &Order) -> PaymentOutcome;
}

/// Which decisions the simulated gateway makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedMode {
    ApproveAll,
    DeclineAll,
    /// Declines orders whose total is strictly above the limit.
    DeclineAbove(Money),
}

/// Deterministic in-process gateway.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedGateway {
    mode: SimulatedMode,
}

impl SimulatedGateway {
    pub fn new(mode: SimulatedMode) -> Self {
        SimulatedGateway { mode }
    }

    pub fn approve_all() -> Self {
        Self::new(SimulatedMode::ApproveAll)
    }

    pub fn decline_all() -> Self {
        Self::new(SimulatedMode::DeclineAll)
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::approve_all()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, order: &Order) -> PaymentOutcome {
        let outcome = match self.mode {
            SimulatedMode::ApproveAll => approved(),
            SimulatedMode::DeclineAll => PaymentOutcome::Declined {
                reason: "Payment declined by processor".to_string(),
            },
            SimulatedMode::DeclineAbove(limit) if order.total() > limit => {
                PaymentOutcome::Declined {
                    reason: format!("Amount {} exceeds limit {}", order.total(), limit),
                }
            }
            SimulatedMode::DeclineAbove(_) => approved(),
        };

        debug!(
            order_id = %order.id,
            total = %order.total(),
            approved = outcome.is_approved(),
            "Simulated charge"
        );
        outcome
    }
}

fn approved() -> PaymentOutcome {
    PaymentOutcome::Approved {
        reference: format!("sim_{}", Uuid::new_v4().simple()),
    }
}
