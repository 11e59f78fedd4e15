//! # Repository Module
//!
//! Database access for Tienda.
//!
//! ## Two Flavors
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-backed repositories             Unit-of-work stores               │
//! │  (db.products(), db.carts(), ...)     (uow.ledger(), uow.orders(), ...) │
//! │                                                                         │
//! │  • Reads for the HTTP layer           • Borrow the open transaction     │
//! │  • Catalog maintenance                • All stock and order writes      │
//! │  • Cart add (own unit of work)        • Rolled back with the unit       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD
//! - [`InventoryLedger`](inventory::InventoryLedger) - Versioned stock writes
//! - [`CartRepository`](cart::CartRepository) / [`CartStore`](cart::CartStore) - Carts
//! - [`OrderRepository`](order::OrderRepository) / [`OrderStore`](order::OrderStore) - Orders

pub mod cart;
pub mod inventory;
pub mod order;
pub mod product;
