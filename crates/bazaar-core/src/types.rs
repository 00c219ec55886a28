//! # Domain Types
//!
//! Core domain types used throughout the Bazaar back office.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog            Inventory             Checkout                      │
//! │  ─────────────      ─────────────         ─────────────                 │
//! │  Branch             StockRecord           Sale                          │
//! │  Category           (product, branch,     BasketLine  (sale, product)   │
//! │  Product             count)               LedgerEntry (minus / plus)    │
//! │                                                                         │
//! │  People             Money movement                                      │
//! │  ─────────────      ─────────────                                       │
//! │  Staff              MoneyTransaction                                    │
//! │  StaffTariff        (withdraw / topup)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is keyed by a UUID v4 string. Monetary fields are `i64`
//! cents with a `Money` accessor. Soft-deleted rows never leave the
//! database layer, so none of these types carry a `deleted_at`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::DEFAULT_PAGE_LIMIT;

// =============================================================================
// Enums
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is open; basket lines may be added.
    #[default]
    InProcess,
    /// Sale has been settled; price is authoritative.
    Success,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::InProcess => "in_process",
            SaleStatus::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StaffType {
    ShopAssistant,
    Cashier,
}

/// How a tariff pays staff: a fixed amount or a percentage of the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    Fixed,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Withdraw,
    Topup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Bonus,
    Sales,
}

/// Direction of a stock movement in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LedgerDirection {
    /// Stock received.
    Plus,
    /// Stock sold; written by settlement.
    Minus,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Parent category for nested catalogs.
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Barcode digits, unique among active products.
    pub barcode: String,

    pub category_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// On-hand count of a product at a branch.
///
/// One active record per (product, branch). Readers still SUM the counts so
/// that legacy duplicate rows are aggregated instead of shadowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockRecord {
    pub id: String,
    pub product_id: String,
    pub branch_id: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable stock movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: String,
    pub staff_id: String,
    pub product_id: String,
    pub direction: LedgerDirection,
    /// Total price of the movement (not a unit price).
    pub price_cents: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale & Basket
// =============================================================================

/// A sale; the aggregate root of checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub branch_id: String,
    pub shop_assistant_id: Option<String>,
    pub cashier_id: String,
    pub payment_type: PaymentType,
    pub status: SaleStatus,
    pub client_name: String,
    /// Zero until settlement, then the sum of basket line prices.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks that the sale still accepts basket changes.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.status != SaleStatus::InProcess {
            return Err(CoreError::InvalidSaleStatus {
                sale_id: self.id.clone(),
                current_status: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }
}

/// One product within one sale's basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BasketLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Accumulated price: each add contributes unit price × added quantity.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BasketLine {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Staff
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StaffTariff {
    pub id: String,
    pub name: String,
    pub tariff_type: TariffType,
    pub amount_for_cash_cents: i64,
    pub amount_for_card_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A staff member. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Staff {
    pub id: String,
    pub branch_id: String,
    pub tariff_id: Option<String>,
    pub staff_type: StaffType,
    pub name: String,
    pub balance_cents: i64,
    pub birth_date: NaiveDate,
    pub login: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// Age in whole years on the given day.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birth_date).unwrap_or(0)
    }

    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Money Transactions
// =============================================================================

/// A balance movement for a staff member (bonus payout, sales commission).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MoneyTransaction {
    pub id: String,
    pub sale_id: Option<String>,
    pub staff_id: String,
    pub transaction_type: TransactionType,
    pub source_type: SourceType,
    pub amount_cents: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MoneyTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Inputs
// =============================================================================
// Create payloads double as full-replacement update payloads.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBranch {
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub barcode: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockRecord {
    pub product_id: String,
    pub branch_id: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub branch_id: String,
    #[serde(default)]
    pub shop_assistant_id: Option<String>,
    pub cashier_id: String,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub client_name: String,
}

/// AddToBasket request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToBasket {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub staff_id: String,
    pub product_id: String,
    pub direction: LedgerDirection,
    pub price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaffTariff {
    pub name: String,
    pub tariff_type: TariffType,
    pub amount_for_cash_cents: i64,
    pub amount_for_card_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub branch_id: String,
    #[serde(default)]
    pub tariff_id: Option<String>,
    pub staff_type: StaffType,
    pub name: String,
    #[serde(default)]
    pub balance_cents: i64,
    pub birth_date: NaiveDate,
    pub login: String,
    pub password: String,
}

/// Staff update; the password has its own operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub branch_id: String,
    #[serde(default)]
    pub tariff_id: Option<String>,
    pub staff_type: StaffType,
    pub name: String,
    pub balance_cents: i64,
    pub birth_date: NaiveDate,
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMoneyTransaction {
    #[serde(default)]
    pub sale_id: Option<String>,
    pub staff_id: String,
    pub transaction_type: TransactionType,
    pub source_type: SourceType,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Listing
// =============================================================================

/// Paging and free-text search for list operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl ListParams {
    pub fn new(page: u32, limit: u32) -> Self {
        ListParams {
            page: page.max(1),
            limit: limit.max(1),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }
}

impl Default for ListParams {
    fn default() -> Self {
        ListParams::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    pub product_id: Option<String>,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub product_id: Option<String>,
    pub staff_id: Option<String>,
}

/// Inclusive bounds on a transaction amount, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub from_cents: Option<i64>,
    pub to_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================
