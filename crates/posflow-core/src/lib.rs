//! # posflow-core: Pure Business Logic for the Posflow Client
//!
//! This crate holds everything about a point-of-sale checkout that can be
//! expressed without touching the network: the wire model shared with the
//! backend, cart totals, the optimistic stock bridge and performance grading.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Posflow Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Dashboards (bar, hospital, school, kiosk, ...)         │   │
//! │  │     Product Grid ──► Cart ──► Checkout ──► Shift Clock          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  posflow-client (PosClient)                     │   │
//! │  │    token cache, request wrapper, product cache, orchestrator    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ posflow-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ inventory │  │performance│  │   │
//! │  │   │SaleRequest│  │ SaleTotals│  │ optimistic│  │ GradeTable│  │   │
//! │  │   │  Product  │  │   Money   │  │  update   │  │   grades  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire types (SaleRequest, Product, Shift, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point math!)
//! - [`pricing`] - Subtotal / tax / discount / total computation
//! - [`inventory`] - Optimistic stock deduction between refreshes
//! - [`performance`] - Elapsed-time grading tables
//! - [`error`] - Domain error types
//! - [`validation`] - Local precondition checks
//!
//! ## Example Usage
//!
//! ```rust
//! use posflow_core::money::Money;
//! use posflow_core::pricing::SaleTotals;
//! use posflow_core::types::{SaleItem, TaxType};
//!
//! let items = vec![SaleItem::new("p-1", "Lager", Money::from_major(150), 2)];
//! let totals = SaleTotals::compute(&items, 10.0, Money::from_major(20), TaxType::Exclusive);
//!
//! assert_eq!(totals.subtotal, Money::from_major(300));
//! assert_eq!(totals.tax_amount, Money::from_major(30));
//! assert_eq!(totals.total, Money::from_major(310));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod money;
pub mod performance;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use inventory::optimistic_inventory_update;
pub use money::Money;
pub use performance::{GradeTable, PerformanceGrade, SALE_GRADES, SHIFT_GRADES};
pub use pricing::SaleTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Age after which a cached product list is no longer served (milliseconds).
pub const PRODUCT_CACHE_TTL_MS: u64 = 5_000;

/// Number of samples kept per metric category.
pub const METRICS_CAPACITY: usize = 100;

/// Requests slower than this are logged as warnings (milliseconds).
pub const SLOW_REQUEST_MS: u64 = 200;
