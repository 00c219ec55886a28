//! # Validation Module
//!
//! Input validation for every write the back office accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  └── JSON shape, enum names, UUID path parameters                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules: names, ids, quantities, prices, passwords            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── Partial UNIQUE indexes on active rows                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{
    AddToBasket, NewBranch, NewCategory, NewLedgerEntry, NewMoneyTransaction, NewProduct, NewSale,
    NewStaff, NewStaffTariff, NewStockRecord, PasswordChange, StaffUpdate,
};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_BARCODE_LEN: usize = 32;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, branch, staff, ...).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a barcode: 1-32 ASCII digits.
///
/// ```rust
/// use bazaar_core::validation::validate_barcode;
///
/// assert!(validate_barcode("5901234123457").is_ok());
/// assert!(validate_barcode("59-01").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a new staff password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an AddToBasket quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount in cents (prices, tariffs, transfers).
pub fn validate_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a product unit price: 0..=MAX_PRICE_CENTS.
pub fn validate_price(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock count entered by inventory management.
pub fn validate_stock_count(count: i64) -> ValidationResult<()> {
    validate_cents("count", count)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use bazaar_core::validation::validate_id;
///
/// assert!(validate_id("sale_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("sale_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

fn validate_optional_id(field: &str, id: Option<&str>) -> ValidationResult<()> {
    match id {
        Some(id) => validate_id(field, id),
        None => Ok(()),
    }
}

// =============================================================================
// Input Validation
// =============================================================================

impl NewBranch {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)
    }
}

impl NewCategory {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_id("parent_id", self.parent_id.as_deref())
    }
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_price(self.price_cents)?;
        validate_barcode(&self.barcode)?;
        validate_optional_id("category_id", self.category_id.as_deref())
    }
}

impl NewStockRecord {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("product_id", &self.product_id)?;
        validate_id("branch_id", &self.branch_id)?;
        validate_stock_count(self.count)
    }
}

impl NewSale {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("branch_id", &self.branch_id)?;
        validate_optional_id("shop_assistant_id", self.shop_assistant_id.as_deref())?;
        validate_id("cashier_id", &self.cashier_id)
    }
}

impl AddToBasket {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("sale_id", &self.sale_id)?;
        validate_id("product_id", &self.product_id)?;
        validate_quantity(self.quantity)
    }
}

impl NewLedgerEntry {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("staff_id", &self.staff_id)?;
        validate_id("product_id", &self.product_id)?;
        validate_cents("price", self.price_cents)?;
        if self.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        Ok(())
    }
}

impl NewStaffTariff {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_cents("amount_for_cash", self.amount_for_cash_cents)?;
        validate_cents("amount_for_card", self.amount_for_card_cents)
    }
}

impl NewStaff {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("branch_id", &self.branch_id)?;
        validate_optional_id("tariff_id", self.tariff_id.as_deref())?;
        validate_name("name", &self.name)?;
        validate_name("login", &self.login)?;
        validate_password(&self.password)
    }
}

impl StaffUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("branch_id", &self.branch_id)?;
        validate_optional_id("tariff_id", self.tariff_id.as_deref())?;
        validate_name("name", &self.name)?;
        validate_name("login", &self.login)
    }
}

impl PasswordChange {
    /// Only the new password has rules; the old one is checked against the hash.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.old_password.is_empty() {
            return Err(ValidationError::Required {
                field: "old_password".to_string(),
            });
        }
        validate_password(&self.new_password)
    }
}

impl NewMoneyTransaction {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_optional_id("sale_id", self.sale_id.as_deref())?;
        validate_id("staff_id", &self.staff_id)?;
        validate_cents("amount", self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentType;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Chilonzor branch").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("4780001234567").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("abc").is_err());
        assert!(validate_barcode(&"1".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(1000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price(MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_price(i64::MAX / 2).is_err());
        assert!(validate_price(-1).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", ID).is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "123").is_err());
    }

    #[test]
    fn test_validate_cents() {
        assert!(validate_cents("price", 0).is_ok());
        assert!(validate_cents("price", 1099).is_ok());
        assert!(validate_cents("price", -1).is_err());
    }

    #[test]
    fn test_input_validation() {
        let sale = NewSale {
            branch_id: ID.to_string(),
            shop_assistant_id: Some("nope".to_string()),
            cashier_id: ID.to_string(),
            payment_type: PaymentType::Card,
            client_name: String::new(),
        };
        assert!(matches!(
            sale.validate(),
            Err(ValidationError::InvalidFormat { ref field, .. }) if field == "shop_assistant_id"
        ));

        let add = AddToBasket {
            sale_id: ID.to_string(),
            product_id: ID.to_string(),
            quantity: 0,
        };
        assert!(add.validate().is_err());

        let change = PasswordChange {
            old_password: "secret".to_string(),
            new_password: "12345".to_string(),
        };
        assert!(matches!(
            change.validate(),
            Err(ValidationError::TooShort { min: 6, .. })
        ));
    }
}
