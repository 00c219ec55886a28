//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - DbError + the checkout step that failed        │
//! │                                                                         │
//! │  HTTP errors (in bazaar-api)                                           │
//! │  └── ApiError         - What clients see (status + JSON body)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (missing or soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found (missing or soft-deleted).
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Not enough stock at the sale's branch.
    ///
    /// ## User Workflow
    /// ```text
    /// Basket already holds 5, stock is 5
    ///      │
    ///      ▼
    /// AddToBasket(qty: 1)
    ///      │
    ///      ▼
    /// InsufficientStock { available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Nothing is written
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding to the basket of a settled sale
    /// - Settling a sale twice
    /// - Editing a settled sale
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Settlement was requested for a sale without basket lines.
    #[error("Sale {0} has no basket lines to settle")]
    EmptyBasket(String),

    /// A money calculation left the representable range.
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// The old password given for a password change does not match.
    #[error("Old password does not match")]
    PasswordMismatch,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 5, requested 6"
        );

        let err = CoreError::InvalidSaleStatus {
            sale_id: "s-1".to_string(),
            current_status: "success".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sale s-1 is success, cannot perform operation"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
