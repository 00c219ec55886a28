//! # Checkout Repository
//!
//! The two read-check-write operations of the back office: adding to a
//! basket and settling a sale. Each runs as one SQLite transaction.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE sales SET updated_at   ◄── claim: takes the write lock first  │
//! │    SELECT sale / product / lines / stock                                │
//! │    plan (bazaar-core, pure)      ◄── stock check, merge, totals         │
//! │    INSERT / UPDATE ...                                                  │
//! │    SELECT result                                                        │
//! │  COMMIT                          ◄── any error before here: ROLLBACK    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite allows one writer at a time. Because the claim is the first
//! statement, a second checkout blocks (up to the busy timeout) before it
//! reads anything, so two requests can never both pass the same stock check.
//!
//! Errors carry the [`CheckoutStep`] that failed.

use bazaar_core::{plan_add, plan_settlement, AddToBasket, BasketChange, BasketLine, CoreError, Sale};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{basket, ledger, product, sale, stock};
use crate::error::{CheckoutContext, CheckoutResult, CheckoutStep, DbError};

/// Runs AddToBasket and SettleSale.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
}

impl CheckoutRepository {
    /// Creates a new CheckoutRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutRepository { pool }
    }

    /// Adds `quantity` of a product to an open sale's basket.
    ///
    /// Merges into the existing line for the product if there is one. The
    /// resulting line quantity never exceeds the stock at the sale's branch.
    /// Returns the written line.
    ///
    /// ## Errors
    /// - `Validate`: malformed ids, quantity outside 1..=999
    /// - `ClaimSale` / `LoadSale`: `SaleNotFound`, `InvalidSaleStatus`
    /// - `LoadProduct`: `ProductNotFound`
    /// - `CheckStock`: `InsufficientStock` (nothing is written)
    pub async fn add_to_basket(&self, input: &AddToBasket) -> CheckoutResult<BasketLine> {
        input.validate().step(CheckoutStep::Validate)?;

        debug!(
            sale_id = %input.sale_id,
            product_id = %input.product_id,
            quantity = input.quantity,
            "Adding to basket"
        );

        let mut tx = self.pool.begin().await.step(CheckoutStep::ClaimSale)?;

        sale::claim(&mut tx, &input.sale_id)
            .await
            .map_err(|e| sale_not_found(e, &input.sale_id))
            .step(CheckoutStep::ClaimSale)?;

        let sale = load_sale(&mut tx, &input.sale_id).await?;
        sale.ensure_open().step(CheckoutStep::LoadSale)?;

        let product = product::fetch_product(&mut tx, &input.product_id)
            .await
            .step(CheckoutStep::LoadProduct)?
            .ok_or_else(|| CoreError::ProductNotFound(input.product_id.clone()))
            .step(CheckoutStep::LoadProduct)?;

        let lines = basket::active_lines(&mut tx, &sale.id)
            .await
            .step(CheckoutStep::LoadBasket)?;

        let available = stock::available(&mut tx, &product.id, &sale.branch_id)
            .await
            .step(CheckoutStep::LoadStock)?;

        let change = match plan_add(&product, &lines, available, input.quantity) {
            Ok(change) => change,
            Err(err) => {
                warn!(
                    sale_id = %sale.id,
                    product_id = %product.id,
                    available,
                    error = %err,
                    "Basket add refused"
                );
                return Err(err).step(CheckoutStep::CheckStock);
            }
        };

        let line_id = match &change {
            BasketChange::Create {
                product_id,
                quantity,
                price,
            } => basket::insert_line(&mut tx, &sale.id, product_id, *quantity, price.cents())
                .await
                .step(CheckoutStep::WriteBasketLine)?,
            BasketChange::Merge {
                line_id,
                quantity,
                price,
            } => {
                basket::update_line(&mut tx, line_id, *quantity, price.cents())
                    .await
                    .step(CheckoutStep::WriteBasketLine)?;
                line_id.clone()
            }
        };

        let line = basket::fetch_line(&mut tx, &line_id)
            .await
            .step(CheckoutStep::Reread)?
            .ok_or_else(|| DbError::not_found("Basket line", &line_id))
            .step(CheckoutStep::Reread)?;

        tx.commit().await.step(CheckoutStep::Commit)?;

        info!(
            sale_id = %sale.id,
            line_id = %line.id,
            quantity = line.quantity,
            price = %line.price(),
            merged = matches!(change, BasketChange::Merge { .. }),
            "Basket line written"
        );

        Ok(line)
    }

    /// Settles an open sale.
    ///
    /// In one transaction: sets the sale price to the sum of its line
    /// prices and the status to `success`, debits the branch stock for every
    /// line and appends one `minus` ledger entry per line (cashier as staff),
    /// in line creation order. Returns the settled sale.
    ///
    /// ## Errors
    /// - `ClaimSale` / `LoadSale`: `SaleNotFound`, `InvalidSaleStatus`
    /// - `CheckStock`: `EmptyBasket`, `InsufficientStock` (nothing is written)
    /// - any later step: the transaction is rolled back
    pub async fn settle_sale(&self, sale_id: &str) -> CheckoutResult<Sale> {
        debug!(sale_id = %sale_id, "Settling sale");

        let mut tx = self.pool.begin().await.step(CheckoutStep::ClaimSale)?;

        sale::claim(&mut tx, sale_id)
            .await
            .map_err(|e| sale_not_found(e, sale_id))
            .step(CheckoutStep::ClaimSale)?;

        let sale = load_sale(&mut tx, sale_id).await?;
        sale.ensure_open().step(CheckoutStep::LoadSale)?;

        let lines = basket::active_lines(&mut tx, &sale.id)
            .await
            .step(CheckoutStep::LoadBasket)?;

        let counts = stock::branch_counts(&mut tx, &sale.branch_id)
            .await
            .step(CheckoutStep::LoadStock)?;

        let plan = match plan_settlement(&sale, &lines, &counts) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(sale_id = %sale.id, error = %err, "Settlement refused");
                return Err(err).step(CheckoutStep::CheckStock);
            }
        };

        sale::mark_settled(&mut tx, &sale.id, plan.total.cents())
            .await
            .step(CheckoutStep::UpdateSalePrice)?;

        for debit in &plan.debits {
            stock::set_count(&mut tx, &debit.product_id, &sale.branch_id, debit.new_count)
                .await
                .step(CheckoutStep::DebitStock)?;
        }

        for draft in &plan.entries {
            ledger::insert_entry(&mut tx, draft)
                .await
                .step(CheckoutStep::AppendLedger)?;
        }

        let settled = sale::fetch_sale(&mut tx, &sale.id)
            .await
            .step(CheckoutStep::Reread)?
            .ok_or_else(|| DbError::not_found("Sale", &sale.id))
            .step(CheckoutStep::Reread)?;

        tx.commit().await.step(CheckoutStep::Commit)?;

        info!(
            sale_id = %settled.id,
            total = %plan.total,
            lines = plan.entries.len(),
            "Sale settled"
        );

        Ok(settled)
    }
}

async fn load_sale(conn: &mut sqlx::SqliteConnection, sale_id: &str) -> CheckoutResult<Sale> {
    sale::fetch_sale(conn, sale_id)
        .await
        .step(CheckoutStep::LoadSale)?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))
        .step(CheckoutStep::LoadSale)
}

fn sale_not_found(err: DbError, sale_id: &str) -> DbError {
    match err {
        DbError::NotFound { .. } => CoreError::SaleNotFound(sale_id.to_string()).into(),
        other => other,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, Shop};
    use bazaar_core::{LedgerDirection, LedgerFilter, ListParams, NewBranch, NewStockRecord, SaleStatus};

    async fn add(shop: &Shop, sale_id: &str, product_id: &str, quantity: i64) -> CheckoutResult<BasketLine> {
        shop.db
            .checkout()
            .add_to_basket(&AddToBasket {
                sale_id: sale_id.to_string(),
                product_id: product_id.to_string(),
                quantity,
            })
            .await
    }

    async fn available(shop: &Shop, product_id: &str) -> i64 {
        shop.db.stock().available(product_id, &shop.branch_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_basket_and_settlement_walkthrough() {
        let shop = fixtures::shop().await;
        let product = shop.product("7001", 100).await;
        shop.stock(&product.id, 5).await;
        let sale = shop.open_sale().await;

        let line = add(&shop, &sale.id, &product.id, 3).await.unwrap();
        assert_eq!((line.quantity, line.price_cents), (3, 300));

        let merged = add(&shop, &sale.id, &product.id, 2).await.unwrap();
        assert_eq!(merged.id, line.id);
        assert_eq!((merged.quantity, merged.price_cents), (5, 500));

        let err = add(&shop, &sale.id, &product.id, 1).await.unwrap_err();
        assert_eq!(err.step, CheckoutStep::CheckStock);
        assert!(matches!(
            err.into_inner(),
            DbError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));

        let settled = shop.db.checkout().settle_sale(&sale.id).await.unwrap();
        assert_eq!(settled.status, SaleStatus::Success);
        assert_eq!(settled.price_cents, 500);
        assert_eq!(available(&shop, &product.id).await, 0);

        let ledger = shop
            .db
            .ledger()
            .list(&LedgerFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(ledger.count, 1);
        let entry = &ledger.items[0];
        assert_eq!(entry.direction, LedgerDirection::Minus);
        assert_eq!(entry.quantity, 5);
        assert_eq!(entry.price_cents, 500);
        assert_eq!(entry.staff_id, shop.cashier_id);
    }

    #[tokio::test]
    async fn test_refused_add_writes_nothing() {
        let shop = fixtures::shop().await;
        let product = shop.product("7002", 100).await;
        shop.stock(&product.id, 2).await;
        let sale = shop.open_sale().await;

        assert!(add(&shop, &sale.id, &product.id, 3).await.is_err());

        let lines = shop.db.baskets().lines_for_sale(&sale.id).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_one_line_per_product_per_sale() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7003", 150).await;
        let milk = shop.product("7004", 90).await;
        shop.stock(&tea.id, 20).await;
        shop.stock(&milk.id, 20).await;
        let sale = shop.open_sale().await;

        for (product_id, quantity) in [(&tea.id, 1), (&milk.id, 2), (&tea.id, 4), (&tea.id, 1)] {
            add(&shop, &sale.id, product_id, quantity).await.unwrap();
        }

        let lines = shop.db.baskets().lines_for_sale(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 2);

        let tea_line = lines.iter().find(|l| l.product_id == tea.id).unwrap();
        assert_eq!((tea_line.quantity, tea_line.price_cents), (6, 900));
        let milk_line = lines.iter().find(|l| l.product_id == milk.id).unwrap();
        assert_eq!((milk_line.quantity, milk_line.price_cents), (2, 180));
    }

    #[tokio::test]
    async fn test_merge_keeps_price_of_earlier_adds() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7005", 100).await;
        shop.stock(&tea.id, 10).await;
        let sale = shop.open_sale().await;

        add(&shop, &sale.id, &tea.id, 2).await.unwrap();

        let mut repriced = bazaar_core::NewProduct {
            name: tea.name.clone(),
            price_cents: 120,
            barcode: tea.barcode.clone(),
            category_id: None,
        };
        repriced.name.push_str(" (new price)");
        shop.db.products().update(&tea.id, &repriced).await.unwrap();

        let line = add(&shop, &sale.id, &tea.id, 1).await.unwrap();
        assert_eq!((line.quantity, line.price_cents), (3, 320));
    }

    #[tokio::test]
    async fn test_settlement_totals_debits_and_ledger() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7006", 150).await;
        let milk = shop.product("7007", 90).await;
        let bread = shop.product("7008", 40).await;
        shop.stock(&tea.id, 10).await;
        shop.stock(&milk.id, 4).await;
        shop.stock(&bread.id, 7).await;
        let sale = shop.open_sale().await;

        add(&shop, &sale.id, &milk.id, 4).await.unwrap();
        add(&shop, &sale.id, &tea.id, 3).await.unwrap();
        add(&shop, &sale.id, &bread.id, 1).await.unwrap();

        let settled = shop.db.checkout().settle_sale(&sale.id).await.unwrap();
        assert_eq!(settled.price_cents, 360 + 450 + 40);

        assert_eq!(available(&shop, &milk.id).await, 0);
        assert_eq!(available(&shop, &tea.id).await, 7);
        assert_eq!(available(&shop, &bread.id).await, 6);

        let ledger = shop
            .db
            .ledger()
            .list(&LedgerFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(ledger.count, 3);
        let products: Vec<&str> = ledger.items.iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(products, vec![milk.id.as_str(), tea.id.as_str(), bread.id.as_str()]);
        let quantities: Vec<i64> = ledger.items.iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![4, 3, 1]);
        let prices: Vec<i64> = ledger.items.iter().map(|e| e.price_cents).collect();
        assert_eq!(prices, vec![360, 450, 40]);
        assert!(ledger.items.iter().all(|e| e.direction == LedgerDirection::Minus));
        assert!(ledger.items.iter().all(|e| e.staff_id == shop.cashier_id));
    }

    #[tokio::test]
    async fn test_price_overflow_is_refused_without_writes() {
        let shop = fixtures::shop().await;
        let gold = shop.product("7016", 100).await;
        shop.stock(&gold.id, 5).await;
        let sale = shop.open_sale().await;

        // a row stored before the price cap existed
        sqlx::query("UPDATE products SET price_cents = ?2 WHERE id = ?1")
            .bind(&gold.id)
            .bind(i64::MAX / 2)
            .execute(shop.db.pool())
            .await
            .unwrap();

        let err = add(&shop, &sale.id, &gold.id, 3).await.unwrap_err();
        assert_eq!(err.step, CheckoutStep::CheckStock);
        assert!(matches!(err.into_inner(), DbError::Domain(CoreError::AmountOverflow(_))));

        assert!(shop.db.baskets().lines_for_sale(&sale.id).await.unwrap().is_empty());
        assert_eq!(available(&shop, &gold.id).await, 5);
    }

    #[tokio::test]
    async fn test_failed_settlement_changes_nothing() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7009", 100).await;
        let milk = shop.product("7010", 100).await;
        shop.stock(&tea.id, 5).await;
        shop.stock(&milk.id, 5).await;
        let sale = shop.open_sale().await;

        add(&shop, &sale.id, &tea.id, 2).await.unwrap();
        add(&shop, &sale.id, &milk.id, 4).await.unwrap();

        // stock shrinks between basket and settlement
        let record = shop
            .db
            .stock()
            .list(
                &bazaar_core::StockFilter {
                    product_id: Some(milk.id.clone()),
                    branch_id: None,
                },
                &ListParams::default(),
            )
            .await
            .unwrap()
            .items
            .remove(0);
        shop.db
            .stock()
            .update(
                &record.id,
                &NewStockRecord {
                    product_id: milk.id.clone(),
                    branch_id: shop.branch_id.clone(),
                    count: 3,
                },
            )
            .await
            .unwrap();

        let err = shop.db.checkout().settle_sale(&sale.id).await.unwrap_err();
        assert_eq!(err.step, CheckoutStep::CheckStock);
        assert!(matches!(
            err.source,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        let unchanged = shop.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, SaleStatus::InProcess);
        assert_eq!(unchanged.price_cents, 0);
        assert_eq!(available(&shop, &tea.id).await, 5);
        assert_eq!(available(&shop, &milk.id).await, 3);

        let ledger = shop
            .db
            .ledger()
            .list(&LedgerFilter::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(ledger.count, 0);
    }

    #[tokio::test]
    async fn test_settled_sale_is_closed() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7011", 100).await;
        shop.stock(&tea.id, 5).await;
        let sale = shop.open_sale().await;

        add(&shop, &sale.id, &tea.id, 1).await.unwrap();
        shop.db.checkout().settle_sale(&sale.id).await.unwrap();

        let again = shop.db.checkout().settle_sale(&sale.id).await.unwrap_err();
        assert!(matches!(
            again.into_inner(),
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));

        let late_add = add(&shop, &sale.id, &tea.id, 1).await.unwrap_err();
        assert!(matches!(
            late_add.into_inner(),
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));

        // one settlement, one debit
        assert_eq!(available(&shop, &tea.id).await, 4);
    }

    #[tokio::test]
    async fn test_empty_basket_cannot_settle() {
        let shop = fixtures::shop().await;
        let sale = shop.open_sale().await;

        let err = shop.db.checkout().settle_sale(&sale.id).await.unwrap_err();
        assert!(matches!(
            err.into_inner(),
            DbError::Domain(CoreError::EmptyBasket(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_sale_and_product() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7012", 100).await;
        shop.stock(&tea.id, 5).await;
        let sale = shop.open_sale().await;
        let missing = "550e8400-e29b-41d4-a716-446655440000";

        let err = add(&shop, missing, &tea.id, 1).await.unwrap_err();
        assert_eq!(err.step, CheckoutStep::ClaimSale);
        assert!(matches!(err.source, DbError::Domain(CoreError::SaleNotFound(_))));

        let err = add(&shop, &sale.id, missing, 1).await.unwrap_err();
        assert_eq!(err.step, CheckoutStep::LoadProduct);
        assert!(matches!(err.source, DbError::Domain(CoreError::ProductNotFound(_))));

        let err = shop.db.checkout().settle_sale(missing).await.unwrap_err();
        assert!(matches!(err.source, DbError::Domain(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_quantity_bounds() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7013", 100).await;
        shop.stock(&tea.id, 5_000).await;
        let sale = shop.open_sale().await;

        for quantity in [0, -2, 1_000] {
            let err = add(&shop, &sale.id, &tea.id, quantity).await.unwrap_err();
            assert_eq!(err.step, CheckoutStep::Validate);
            assert!(matches!(err.source, DbError::Domain(CoreError::Validation(_))));
        }

        assert!(add(&shop, &sale.id, &tea.id, 999).await.is_ok());
    }

    #[tokio::test]
    async fn test_stock_is_scoped_to_sale_branch() {
        let shop = fixtures::shop().await;
        let tea = shop.product("7014", 100).await;

        let elsewhere = shop
            .db
            .branches()
            .create(&NewBranch {
                name: "Warehouse".to_string(),
                address: String::new(),
            })
            .await
            .unwrap();
        shop.db
            .stock()
            .create(&NewStockRecord {
                product_id: tea.id.clone(),
                branch_id: elsewhere.id.clone(),
                count: 50,
            })
            .await
            .unwrap();
        shop.stock(&tea.id, 1).await;

        let sale = shop.open_sale().await;
        let err = add(&shop, &sale.id, &tea.id, 2).await.unwrap_err();
        assert!(matches!(
            err.into_inner(),
            DbError::Domain(CoreError::InsufficientStock { available: 1, .. })
        ));

        add(&shop, &sale.id, &tea.id, 1).await.unwrap();
        shop.db.checkout().settle_sale(&sale.id).await.unwrap();

        let warehouse = shop.db.stock().available(&tea.id, &elsewhere.id).await.unwrap();
        assert_eq!(warehouse, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixtures::file_shop(dir.path()).await;
        let db = shop.db.clone();

        let tea = shop.product("7015", 100).await;
        shop.stock(&tea.id, 5).await;
        let sale = shop.open_sale().await;

        let mut handles = Vec::new();
        for _ in 0..12 {
            let checkout = db.checkout();
            let input = AddToBasket {
                sale_id: sale.id.clone(),
                product_id: tea.id.clone(),
                quantity: 1,
            };
            handles.push(tokio::spawn(async move { checkout.add_to_basket(&input).await }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert!(
                    matches!(err.source, DbError::Domain(CoreError::InsufficientStock { .. })),
                    "unexpected failure: {err}"
                ),
            }
        }
        assert_eq!(accepted, 5);

        let lines = db.baskets().lines_for_sale(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].price_cents, 500);

        let settled = db.checkout().settle_sale(&sale.id).await.unwrap();
        assert_eq!(settled.price_cents, 500);
        assert_eq!(db.stock().available(&tea.id, &shop.branch_id).await.unwrap(), 0);
    }
}
