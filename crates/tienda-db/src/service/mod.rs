//! # Services
//!
//! Business operations that span several repositories. Each public
//! operation runs in exactly one unit of work.
//!
//! - [`checkout::CheckoutService`] - cart → Pending order
//! - [`lifecycle::OrderService`] - pay, cancel, ship, privileged cancel
//! - [`payment`] - the payment gateway seam and its simulated implementation

pub mod checkout;
pub mod lifecycle;
pub mod payment;
