//! # bazaar-db: Persistence Gateway for the Bazaar Back Office
//!
//! Every read and write of the back office goes through this crate. It
//! stores everything in SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /basket, PUT /end-sell/{id}, CRUD)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     bazaar-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐   │    │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │   │    │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │   │    │
//! │  │   │               │◄───│ Product, Stock,    │  │            │   │    │
//! │  │   │ SqlitePool    │    │ Sale, Basket, ...  │  │ 001_init   │   │    │
//! │  │   │               │    │ CheckoutRepository │  │            │   │    │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘   │    │
//! │  │                              │                                  │    │
//! │  │                              ▼                                  │    │
//! │  │                 bazaar-core planners (pure)                     │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and checkout error types
//! - [`repository`] - One repository per entity, plus the checkout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bazaar.db")).await?;
//!
//! let line = db.checkout().add_to_basket(&request).await?;
//! let sale = db.checkout().settle_sale(&line.sale_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CheckoutError, CheckoutResult, CheckoutStep, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    BasketRepository, BranchRepository, CategoryRepository, CheckoutRepository, LedgerRepository,
    ProductRepository, SaleRepository, StaffRepository, StockRepository, TariffRepository,
    TransactionRepository,
};
