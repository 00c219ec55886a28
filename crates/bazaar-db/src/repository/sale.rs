//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create ──► in_process (price 0) ──► AddToBasket × N ──► SettleSale     │
//! │                  │                                          │           │
//! │                  └── update / soft_delete                   ▼           │
//! │                                                  success (price = Σ)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status and price are owned by the checkout; `update` only touches the
//! descriptive fields of an open sale.

use bazaar_core::{ListParams, NewSale, Page, Sale, SaleStatus};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, branch_id, shop_assistant_id, cashier_id, payment_type, status, \
                       client_name, price_cents, created_at, updated_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Opens a new sale with an empty basket.
    pub async fn create(&self, input: &NewSale) -> DbResult<Sale> {
        input.validate()?;

        let now = Utc::now();
        let sale = Sale {
            id: new_id(),
            branch_id: input.branch_id.clone(),
            shop_assistant_id: input.shop_assistant_id.clone(),
            cashier_id: input.cashier_id.clone(),
            payment_type: input.payment_type,
            status: SaleStatus::InProcess,
            client_name: input.client_name.trim().to_string(),
            price_cents: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, branch_id = %sale.branch_id, "Opening sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, branch_id, shop_assistant_id, cashier_id, payment_type,
                status, client_name, price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.branch_id)
        .bind(&sale.shop_assistant_id)
        .bind(&sale.cashier_id)
        .bind(sale.payment_type)
        .bind(sale.status)
        .bind(&sale.client_name)
        .bind(sale.price_cents)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets an active sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Lists active sales, newest first, searching the client name.
    pub async fn list(&self, params: &ListParams) -> DbResult<Page<Sale>> {
        let pattern = like_pattern(params.search.as_deref());

        debug!(page = params.page, search = ?params.search, "Listing sales");

        let items = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {COLUMNS} FROM sales
            WHERE deleted_at IS NULL AND (?1 IS NULL OR client_name LIKE ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(pattern.as_deref())
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE deleted_at IS NULL AND (?1 IS NULL OR client_name LIKE ?1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    /// Updates the descriptive fields of an open sale.
    ///
    /// Fails with `InvalidSaleStatus` once the sale is settled.
    pub async fn update(&self, id: &str, input: &NewSale) -> DbResult<Sale> {
        input.validate()?;

        debug!(id = %id, "Updating sale");

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET branch_id = ?2, shop_assistant_id = ?3, cashier_id = ?4,
                payment_type = ?5, client_name = ?6, updated_at = ?7
            WHERE id = ?1 AND status = 'in_process' AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&input.branch_id)
        .bind(&input.shop_assistant_id)
        .bind(&input.cashier_id)
        .bind(input.payment_type)
        .bind(input.client_name.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let sale = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        if result.rows_affected() == 0 {
            // the row exists, so the status guard refused it
            sale.ensure_open()?;
        }

        Ok(sale)
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting sale");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE sales SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }
}

// =============================================================================
// Connection-level queries (shared with checkout)
// =============================================================================

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sales WHERE id = ?1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

/// Touches the sale row as the first write of a checkout transaction.
///
/// SQLite takes its write lock on the first write, so every later read in
/// the transaction sees a basket no concurrent checkout can change.
pub(crate) async fn claim(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("UPDATE sales SET updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL")
        .bind(id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", id));
    }

    Ok(())
}

/// Claims the sale that owns an active basket line.
///
/// Same lock as [`claim`], taken before anything in the transaction reads.
pub(crate) async fn claim_for_line(conn: &mut SqliteConnection, line_id: &str) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales SET updated_at = ?2
        WHERE id = (SELECT sale_id FROM basket_lines WHERE id = ?1 AND deleted_at IS NULL)
          AND deleted_at IS NULL
        "#,
    )
    .bind(line_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Basket line", line_id));
    }

    Ok(())
}

/// Writes the settled price and flips the sale to `success`.
pub(crate) async fn mark_settled(conn: &mut SqliteConnection, id: &str, price_cents: i64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales SET price_cents = ?2, status = ?3, updated_at = ?4
        WHERE id = ?1 AND status = ?5 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(price_cents)
    .bind(SaleStatus::Success)
    .bind(Utc::now())
    .bind(SaleStatus::InProcess)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", id));
    }

    Ok(())
}
