//! # Sale Settlement Planning
//!
//! Turns an open sale, its basket lines and the branch stock into the exact
//! set of writes SettleSale must apply atomically.
//!
//! ## What A Plan Contains
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Inputs                         Plan                                    │
//! │  ─────────────────────          ──────────────────────────────────────  │
//! │  Sale (in_process)        ──►   total = Σ line.price                    │
//! │  BasketLine × N           ──►   StockDebit × N  (running count per      │
//! │  branch stock map               product, creation order)                │
//! │  {product_id → count}     ──►   LedgerDraft × N (minus, cashier,        │
//! │                                 line.price, line.quantity)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are processed in creation order so the ledger is deterministic.
//! A debit that would leave a negative count rejects the whole plan.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BasketLine, LedgerDirection, Sale};

/// New count for one (product, branch) stock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDebit {
    pub product_id: String,
    pub quantity: i64,
    pub new_count: i64,
}

/// A ledger entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDraft {
    pub staff_id: String,
    pub product_id: String,
    pub direction: LedgerDirection,
    pub price: Money,
    pub quantity: i64,
}

/// Every write of a settlement, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub sale_id: String,
    pub total: Money,
    pub debits: Vec<StockDebit>,
    pub entries: Vec<LedgerDraft>,
}

/// Plans the settlement of `sale`.
///
/// `stock` maps product id to the summed count at the sale's branch; a
/// product missing from the map has zero stock.
///
/// ## Errors
/// - `InvalidSaleStatus` if the sale was already settled
/// - `EmptyBasket` if there are no lines
/// - `InsufficientStock` if a debit would take a count below zero
pub fn plan_settlement(
    sale: &Sale,
    lines: &[BasketLine],
    stock: &HashMap<String, i64>,
) -> CoreResult<SettlementPlan> {
    sale.ensure_open()?;

    if lines.is_empty() {
        return Err(CoreError::EmptyBasket(sale.id.clone()));
    }

    let mut ordered: Vec<&BasketLine> = lines.iter().collect();
    // stable: lines with equal timestamps keep the caller's order
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let total = Money::checked_sum(ordered.iter().map(|line| line.price()))?;

    let mut remaining: HashMap<&str, i64> = HashMap::new();
    let mut debits = Vec::with_capacity(ordered.len());
    let mut entries = Vec::with_capacity(ordered.len());

    for line in ordered {
        let count = remaining
            .entry(line.product_id.as_str())
            .or_insert_with(|| stock.get(&line.product_id).copied().unwrap_or(0));

        let new_count = *count - line.quantity;
        if new_count < 0 {
            return Err(CoreError::InsufficientStock {
                product_id: line.product_id.clone(),
                available: *count,
                requested: line.quantity,
            });
        }
        *count = new_count;

        debits.push(StockDebit {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            new_count,
        });
        entries.push(LedgerDraft {
            staff_id: sale.cashier_id.clone(),
            product_id: line.product_id.clone(),
            direction: LedgerDirection::Minus,
            price: line.price(),
            quantity: line.quantity,
        });
    }

    Ok(SettlementPlan {
        sale_id: sale.id.clone(),
        total,
        debits,
        entries,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
