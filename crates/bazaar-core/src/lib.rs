//! # bazaar-core: Pure Business Logic for the Bazaar Back Office
//!
//! Domain types, money arithmetic, validation and the two checkout planners
//! (basket merge and sale settlement). Nothing in here touches a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bazaar Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 bazaar-api (axum REST server)                   │   │
//! │  │    POST /basket ──► PUT /end-sell/{id} ──► CRUD endpoints       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bazaar-db (persistence gateway)                 │   │
//! │  │      repositories, checkout transactions, migrations            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls planners                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  basket   │  │settlement │  │   │
//! │  │   │  Product  │  │   Money   │  │ plan_add  │  │   plan_   │  │   │
//! │  │   │   Sale    │  │           │  │           │  │settlement │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities, inputs and list envelopes
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`basket`] - AddToBasket decision logic
//! - [`settlement`] - SettleSale planning
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::Money;
//!
//! let unit_price = Money::from_cents(100);
//! assert_eq!(unit_price.multiply_quantity(3).cents(), 300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod basket;
pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use basket::{plan_add, BasketChange};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settlement::{plan_settlement, LedgerDraft, SettlementPlan, StockDebit};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted by a single AddToBasket request.
///
/// Guards against typing 1000 instead of 10 at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest unit price a product may carry, in cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Minimum length of a staff password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Page size used when a list request does not name one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
