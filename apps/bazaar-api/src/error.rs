//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Bazaar API                         │
//! │                                                                         │
//! │  Handler  Result<T, ApiError>                                           │
//! │     │                                                                   │
//! │     ├── CheckoutError { step, source } ──► logged with step ──┐         │
//! │     ├── DbError::NotFound / UniqueViolation / ... ────────────┤         │
//! │     ├── DbError::Domain(CoreError) ───────────────────────────┤         │
//! │     └── bad path id / bad JSON ───────────────────────────────┤         │
//! │                                                               ▼         │
//! │                                     ApiError { code, message }          │
//! │                                                               │         │
//! │                                   status code + JSON body ◄───┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for ..." }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bazaar_core::CoreError;
use bazaar_db::{CheckoutError, DbError};
use serde::Serialize;
use tracing::{error, warn};

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Unique constraint hit (409)
    Conflict,

    /// Not enough stock at the sale's branch (422)
    InsufficientStock,

    /// Business rule refused the operation (422)
    BusinessLogic,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock | ErrorCode::BusinessLogic => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Domain(e) => ApiError::from(e),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ (CoreError::InvalidSaleStatus { .. } | CoreError::AmountOverflow(_)) => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            e @ (CoreError::EmptyBasket(_) | CoreError::PasswordMismatch) => {
                ApiError::validation(e.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts checkout errors. The failed step is always logged, and server-side
/// failures also carry it in the message.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        let step = err.step;
        let api = ApiError::from(err.into_inner());

        match api.code.status() {
            status if status.is_server_error() => {
                error!(%step, message = %api.message, "Checkout failed");
                ApiError::new(api.code, format!("{step}: {}", api.message))
            }
            _ => {
                warn!(%step, code = ?api.code, message = %api.message, "Checkout refused");
                api
            }
        }
    }
}
