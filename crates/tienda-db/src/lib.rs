//! # tienda-db: Database Layer for Tienda
//!
//! SQLite storage through sqlx, plus the services that turn carts into
//! orders and move orders through their lifecycle.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tienda Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /orders/checkout)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tienda-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   Services    │   │  UnitOfWork   │   │  Repositories │    │   │
//! │  │   │ Checkout      │──►│  (1 tx)       │──►│ Ledger, Cart  │    │   │
//! │  │   │ OrderService  │   │               │   │ Order,Product │    │   │
//! │  │   └───────────────┘   └───────────────┘   └───────────────┘    │   │
//! │  │            │                                                    │   │
//! │  │            ▼                                                    │   │
//! │  │   PaymentGateway (seam)                                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys, embedded migrations)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`unit_of_work`] - Transaction handle shared by one business operation
//! - [`repository`] - Repository implementations
//! - [`service`] - Checkout, order lifecycle, payment gateway
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tienda_db::{CheckoutService, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tienda.db")).await?;
//! db.carts().add_item("user-1", "product-1", 2).await?;
//! let order = CheckoutService::new(db.clone()).checkout("user-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};
pub use unit_of_work::{retry_on_conflict, UnitOfWork, MAX_CONFLICT_ATTEMPTS};

pub use repository::cart::CartRepository;
pub use repository::inventory::InventoryLedger;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;

pub use service::checkout::CheckoutService;
pub use service::lifecycle::{OrderService, PaymentResult};
pub use service::payment::{PaymentGateway, PaymentOutcome, SimulatedGateway, SimulatedMode};
