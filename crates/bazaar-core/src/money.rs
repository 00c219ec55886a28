//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! Every price, balance and amount in the back office is stored as an `i64`
//! count of the smallest currency unit. Floating point never enters the
//! calculation path; the settlement total is a plain integer sum of basket
//! line prices.
//!
//! The planners use the `checked_*` operations, which fail with
//! [`CoreError::AmountOverflow`] instead of wrapping. The operator impls are
//! for values already known to be small (tests, fixtures, display).
//!
//! ## Usage
//! ```rust
//! use bazaar_core::money::Money;
//!
//! let unit_price = Money::from_cents(100);
//! let line = unit_price.multiply_quantity(3);
//! let merged = line + unit_price.multiply_quantity(2);
//! assert_eq!(merged.cents(), 500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price_cents ──► plan_add ──► BasketLine.price_cents            │
/// │                          (unit × qty, added onto the line on merge)     │
/// │                                                                         │
/// │  Σ BasketLine.price_cents ──► plan_settlement ──► Sale.price_cents      │
/// │                                                │                        │
/// │                                                └──► LedgerEntry.price   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, failing instead of overflowing.
    ///
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_multiply_quantity(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3).is_err());
    /// ```
    pub fn checked_multiply_quantity(&self, qty: i64) -> CoreResult<Self> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or_else(|| CoreError::AmountOverflow(format!("{} x {}", self, qty)))
    }

    /// Adds two amounts, failing instead of overflowing.
    pub fn checked_add(&self, other: Money) -> CoreResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| CoreError::AmountOverflow(format!("{} + {}", self, other)))
    }

    /// Sums amounts, failing on the first overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> CoreResult<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display, e.g. `12.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Settlement totals are folded with `.sum()`.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_cents(200);
        assert_eq!(c.cents(), 1300);
    }

    #[test]
    fn test_sum() {
        let lines = [300, 200, 0, 45].map(Money::from_cents);
        let total: Money = lines.into_iter().sum();
        assert_eq!(total.cents(), 545);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_checked_operations() {
        let unit = Money::from_cents(150);
        assert_eq!(unit.checked_multiply_quantity(4).unwrap().cents(), 600);
        assert_eq!(unit.checked_add(Money::from_cents(50)).unwrap().cents(), 200);

        let huge = Money::from_cents(i64::MAX / 2);
        assert!(matches!(
            huge.checked_multiply_quantity(3),
            Err(CoreError::AmountOverflow(_))
        ));
        assert!(matches!(
            huge.checked_add(huge).and_then(|m| m.checked_add(Money::from_cents(2))),
            Err(CoreError::AmountOverflow(_))
        ));
        assert!(Money::checked_sum([huge, huge, huge]).is_err());
        assert_eq!(
            Money::checked_sum([unit, unit, Money::from_cents(1)]).unwrap().cents(),
            301
        );
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_cents(500)).unwrap();
        assert_eq!(json, "500");
    }
}
