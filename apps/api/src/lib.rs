//! # Tienda API
//!
//! HTTP surface for carts, checkout and order fulfillment.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request ──► TraceLayer ──► Router ──► Actor (headers) ──► handler      │
//! │                                                              │          │
//! │                 ┌────────────────────────────────────────────┤          │
//! │                 ▼                    ▼                       ▼          │
//! │           db.carts()         CheckoutService           OrderService     │
//! │                                                              │          │
//! │                                                       PaymentGateway    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use tienda_db::{CheckoutService, Database, OrderService, PaymentGateway};

/// Shared application state, cloned into every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub checkout: CheckoutService,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>) -> Self {
        AppState {
            checkout: CheckoutService::new(db.clone()),
            orders: OrderService::new(db.clone(), gateway),
            db,
        }
    }
}

/// Builds the full router with request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
