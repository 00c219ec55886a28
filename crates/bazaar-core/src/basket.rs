//! # Basket Planning
//!
//! Decides what AddToBasket writes, given what is already in the sale's
//! basket and how much stock the sale's branch holds.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_add(product, lines, available, qty)                               │
//! │       │                                                                 │
//! │       ├── qty <= 0 or > 999 ──────────────► Validation error            │
//! │       │                                                                 │
//! │       ├── line for product exists?                                      │
//! │       │     yes: merged = line.qty + qty                                │
//! │       │          available >= merged ─────► Merge { merged,             │
//! │       │                                       line.price + unit × qty } │
//! │       │          otherwise ───────────────► InsufficientStock           │
//! │       │                                                                 │
//! │       │     no:  available >= qty ────────► Create { qty, unit × qty }  │
//! │       │          otherwise ───────────────► InsufficientStock           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The planner never sees the database. The caller supplies the sale's
//! active lines and the summed stock, then applies the returned change
//! inside its own transaction.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BasketLine, Product};
use crate::validation::validate_quantity;

/// The single basket write an AddToBasket call performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasketChange {
    /// No active line for the product yet.
    Create {
        product_id: String,
        quantity: i64,
        price: Money,
    },
    /// Fold the added quantity into an existing line.
    Merge {
        line_id: String,
        quantity: i64,
        price: Money,
    },
}

impl BasketChange {
    /// Quantity the line will hold after the write.
    pub fn quantity(&self) -> i64 {
        match self {
            BasketChange::Create { quantity, .. } | BasketChange::Merge { quantity, .. } => {
                *quantity
            }
        }
    }

    /// Accumulated line price after the write.
    pub fn price(&self) -> Money {
        match self {
            BasketChange::Create { price, .. } | BasketChange::Merge { price, .. } => *price,
        }
    }
}

/// Plans adding `quantity` of `product` to a basket.
///
/// `lines` are the active lines of the target sale; lines of other products
/// are ignored. `available` is the summed stock for the product at the sale's
/// branch.
///
/// ## Example
/// ```rust
/// # use bazaar_core::{plan_add, BasketChange, Product};
/// # use chrono::Utc;
/// # let product = Product { id: "p".into(), name: "Tea".into(), price_cents: 100,
/// #     barcode: "1".into(), category_id: None, created_at: Utc::now(), updated_at: Utc::now() };
/// let change = plan_add(&product, &[], 5, 3).unwrap();
/// assert_eq!(change.quantity(), 3);
/// assert_eq!(change.price().cents(), 300);
/// ```
pub fn plan_add(
    product: &Product,
    lines: &[BasketLine],
    available: i64,
    quantity: i64,
) -> CoreResult<BasketChange> {
    validate_quantity(quantity)?;

    let added_price = product.price().checked_multiply_quantity(quantity)?;

    match lines.iter().find(|line| line.product_id == product.id) {
        Some(line) => {
            let merged = line.quantity + quantity;
            ensure_stock(&product.id, available, merged)?;

            Ok(BasketChange::Merge {
                line_id: line.id.clone(),
                quantity: merged,
                price: line.price().checked_add(added_price)?,
            })
        }
        None => {
            ensure_stock(&product.id, available, quantity)?;

            Ok(BasketChange::Create {
                product_id: product.id.clone(),
                quantity,
                price: added_price,
            })
        }
    }
}

fn ensure_stock(product_id: &str, available: i64, requested: i64) -> CoreResult<()> {
    if available < requested {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            available,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
