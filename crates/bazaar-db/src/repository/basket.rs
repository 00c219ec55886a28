//! # Basket Repository
//!
//! Reads and removals of basket lines. Lines are written only by the
//! checkout (`AddToBasket`), which owns the stock check and the merge rule.
//!
//! ## Line Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ORDER BY created_at, rowid                                             │
//! │                                                                         │
//! │  Creation order drives the settlement ledger. rowid breaks ties         │
//! │  between lines written within the same timestamp tick.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bazaar_core::{BasketLine, ListParams, Page};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{new_id, sale};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, sale_id, product_id, quantity, price_cents, created_at, updated_at";

/// Repository for basket line operations.
#[derive(Debug, Clone)]
pub struct BasketRepository {
    pool: SqlitePool,
}

impl BasketRepository {
    /// Creates a new BasketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BasketRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<BasketLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_line(&mut conn, id).await
    }

    /// Lists active lines, optionally restricted to one sale, in creation order.
    pub async fn list(&self, sale_id: Option<&str>, params: &ListParams) -> DbResult<Page<BasketLine>> {
        debug!(sale_id = ?sale_id, page = params.page, "Listing basket lines");

        let items = sqlx::query_as::<_, BasketLine>(&format!(
            r#"
            SELECT {COLUMNS} FROM basket_lines
            WHERE deleted_at IS NULL AND (?1 IS NULL OR sale_id = ?1)
            ORDER BY created_at, rowid
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(sale_id)
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM basket_lines WHERE deleted_at IS NULL AND (?1 IS NULL OR sale_id = ?1)",
        )
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    /// Every active line of a sale, in creation order.
    pub async fn lines_for_sale(&self, sale_id: &str) -> DbResult<Vec<BasketLine>> {
        let mut conn = self.pool.acquire().await?;
        active_lines(&mut conn, sale_id).await
    }

    /// Removes a line from an open sale's basket.
    ///
    /// Runs under the same sale claim as the checkout, so a removal cannot
    /// interleave with a settlement of the same sale. The claim is the first
    /// statement: a read first would pin a WAL snapshot that can no longer be
    /// upgraded to a write once another checkout commits.
    pub async fn remove(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Removing basket line");

        let mut tx = self.pool.begin().await?;

        sale::claim_for_line(&mut tx, id).await?;

        let line = fetch_line(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Basket line", id))?;
        let owner = sale::fetch_sale(&mut tx, &line.sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &line.sale_id))?;
        owner.ensure_open()?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE basket_lines SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Basket line", id));
        }

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Connection-level queries (shared with checkout)
// =============================================================================

pub(crate) async fn fetch_line(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<BasketLine>> {
    let line = sqlx::query_as::<_, BasketLine>(&format!(
        "SELECT {COLUMNS} FROM basket_lines WHERE id = ?1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(line)
}

pub(crate) async fn active_lines(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<BasketLine>> {
    let lines = sqlx::query_as::<_, BasketLine>(&format!(
        r#"
        SELECT {COLUMNS} FROM basket_lines
        WHERE sale_id = ?1 AND deleted_at IS NULL
        ORDER BY created_at, rowid
        "#
    ))
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Inserts a new line and returns its id.
pub(crate) async fn insert_line(
    conn: &mut SqliteConnection,
    sale_id: &str,
    product_id: &str,
    quantity: i64,
    price_cents: i64,
) -> DbResult<String> {
    let id = new_id();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO basket_lines (id, sale_id, product_id, quantity, price_cents, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
    )
    .bind(&id)
    .bind(sale_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price_cents)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(id)
}

pub(crate) async fn update_line(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    price_cents: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE basket_lines SET quantity = ?2, price_cents = ?3, updated_at = ?4
        WHERE id = ?1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(price_cents)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Basket line", id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use bazaar_core::{AddToBasket, CoreError};

    #[tokio::test]
    async fn test_list_by_sale_in_creation_order() {
        let shop = fixtures::shop().await;
        let tea = shop.product("5001", 100).await;
        let milk = shop.product("5002", 250).await;
        shop.stock(&tea.id, 10).await;
        shop.stock(&milk.id, 10).await;

        let sale = shop.open_sale().await;
        let other = shop.open_sale().await;

        for (sale_id, product_id) in [(&sale.id, &milk.id), (&sale.id, &tea.id), (&other.id, &tea.id)] {
            shop.db
                .checkout()
                .add_to_basket(&AddToBasket {
                    sale_id: sale_id.clone(),
                    product_id: product_id.clone(),
                    quantity: 1,
                })
                .await
                .unwrap();
        }

        let page = shop
            .db
            .baskets()
            .list(Some(&sale.id), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.items[0].product_id, milk.id);
        assert_eq!(page.items[1].product_id, tea.id);

        let all = shop.db.baskets().list(None, &ListParams::default()).await.unwrap();
        assert_eq!(all.count, 3);
    }

    #[tokio::test]
    async fn test_remove_line_from_open_sale() {
        let shop = fixtures::shop().await;
        let tea = shop.product("5003", 100).await;
        shop.stock(&tea.id, 10).await;
        let sale = shop.open_sale().await;

        let line = shop
            .db
            .checkout()
            .add_to_basket(&AddToBasket {
                sale_id: sale.id.clone(),
                product_id: tea.id.clone(),
                quantity: 2,
            })
            .await
            .unwrap();

        shop.db.baskets().remove(&line.id).await.unwrap();
        assert!(shop.db.baskets().get_by_id(&line.id).await.unwrap().is_none());
        assert!(shop.db.baskets().lines_for_sale(&sale.id).await.unwrap().is_empty());

        let err = shop.db.baskets().remove(&line.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_line_from_settled_sale_is_rejected() {
        let shop = fixtures::shop().await;
        let tea = shop.product("5004", 100).await;
        shop.stock(&tea.id, 10).await;
        let sale = shop.open_sale().await;

        let line = shop
            .db
            .checkout()
            .add_to_basket(&AddToBasket {
                sale_id: sale.id.clone(),
                product_id: tea.id.clone(),
                quantity: 2,
            })
            .await
            .unwrap();
        shop.db.checkout().settle_sale(&sale.id).await.unwrap();

        let err = shop.db.baskets().remove(&line.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));
        assert!(shop.db.baskets().get_by_id(&line.id).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_removes_wait_for_concurrent_adds() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixtures::file_shop(dir.path()).await;
        let sale = shop.open_sale().await;

        let mut line_ids = Vec::new();
        for n in 0..20 {
            let product = shop.product(&format!("52{n:02}"), 100).await;
            shop.stock(&product.id, 5).await;
            let line = shop
                .db
                .checkout()
                .add_to_basket(&AddToBasket {
                    sale_id: sale.id.clone(),
                    product_id: product.id.clone(),
                    quantity: 1,
                })
                .await
                .unwrap();
            line_ids.push(line.id);
        }

        let tea = shop.product("5299", 100).await;
        shop.stock(&tea.id, 10).await;

        let removes: Vec<_> = line_ids
            .iter()
            .map(|id| {
                let baskets = shop.db.baskets();
                let id = id.clone();
                tokio::spawn(async move { baskets.remove(&id).await })
            })
            .collect();
        let adds: Vec<_> = (0..4)
            .map(|_| {
                let checkout = shop.db.checkout();
                let input = AddToBasket {
                    sale_id: sale.id.clone(),
                    product_id: tea.id.clone(),
                    quantity: 1,
                };
                tokio::spawn(async move { checkout.add_to_basket(&input).await })
            })
            .collect();

        for handle in removes {
            handle.await.unwrap().unwrap();
        }
        for handle in adds {
            handle.await.unwrap().unwrap();
        }

        let lines = shop.db.baskets().lines_for_sale(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, tea.id);
        assert_eq!(lines[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_remove_unknown_line_is_not_found() {
        let shop = fixtures::shop().await;

        let err = shop
            .db
            .baskets()
            .remove("550e8400-e29b-41d4-a716-446655440000")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Basket line"));
    }
}
