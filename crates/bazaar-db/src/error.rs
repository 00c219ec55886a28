//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Business rule (CoreError)          │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  DbError (this module) ◄───────────── DbError::Domain                   │
//! │       │                                                                 │
//! │       ├──► CheckoutError { step, source }  (AddToBasket / SettleSale)   │
//! │       ▼                                                                 │
//! │  ApiError (bazaar-api) ← Status code + JSON body                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use bazaar_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - ID doesn't exist
    /// - Soft-deleted record
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two active products with one barcode
    /// - A second active stock record for a (product, branch)
    /// - Duplicate staff login
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation (unknown branch, product, staff...).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule refused the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>[, <table>.<column>]"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Errors
// =============================================================================

/// The step of a checkout operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Validate,
    ClaimSale,
    LoadSale,
    LoadProduct,
    LoadBasket,
    LoadStock,
    CheckStock,
    WriteBasketLine,
    UpdateSalePrice,
    DebitStock,
    AppendLedger,
    Commit,
    Reread,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutStep::Validate => "validate input",
            CheckoutStep::ClaimSale => "claim sale",
            CheckoutStep::LoadSale => "load sale",
            CheckoutStep::LoadProduct => "load product",
            CheckoutStep::LoadBasket => "load basket lines",
            CheckoutStep::LoadStock => "load stock",
            CheckoutStep::CheckStock => "check stock",
            CheckoutStep::WriteBasketLine => "write basket line",
            CheckoutStep::UpdateSalePrice => "update sale price",
            CheckoutStep::DebitStock => "debit stock",
            CheckoutStep::AppendLedger => "append ledger entry",
            CheckoutStep::Commit => "commit",
            CheckoutStep::Reread => "re-read result",
        };
        f.write_str(name)
    }
}

/// A failed AddToBasket or SettleSale, annotated with the step that failed.
#[derive(Debug, Error)]
#[error("{step}: {source}")]
pub struct CheckoutError {
    pub step: CheckoutStep,
    #[source]
    pub source: DbError,
}

impl CheckoutError {
    /// The underlying error, without the step annotation.
    pub fn into_inner(self) -> DbError {
        self.source
    }
}

/// Attaches a [`CheckoutStep`] to any error convertible into [`DbError`].
pub trait CheckoutContext<T> {
    fn step(self, step: CheckoutStep) -> Result<T, CheckoutError>;
}

impl<T, E> CheckoutContext<T> for Result<T, E>
where
    E: Into<DbError>,
{
    fn step(self, step: CheckoutStep) -> Result<T, CheckoutError> {
        self.map_err(|err| CheckoutError {
            step,
            source: err.into(),
        })
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
