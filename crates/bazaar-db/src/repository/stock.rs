//! # Stock Repository
//!
//! Database operations for stock records: the on-hand count of a product
//! at a branch.
//!
//! ## Availability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  available(product, branch) = SUM(count) over active records            │
//! │                                                                         │
//! │  One active record per (product, branch) is enforced by a partial       │
//! │  unique index. Reads still aggregate so a pre-index duplicate is        │
//! │  counted instead of silently hidden.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use bazaar_core::{ListParams, NewStockRecord, Page, StockFilter, StockRecord};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::new_id;
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, product_id, branch_id, count, created_at, updated_at";

/// Repository for stock record operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Creates the stock record for a (product, branch) pair.
    pub async fn create(&self, input: &NewStockRecord) -> DbResult<StockRecord> {
        input.validate()?;

        let now = Utc::now();
        let record = StockRecord {
            id: new_id(),
            product_id: input.product_id.clone(),
            branch_id: input.branch_id.clone(),
            count: input.count,
            created_at: now,
            updated_at: now,
        };

        debug!(
            product_id = %record.product_id,
            branch_id = %record.branch_id,
            count = record.count,
            "Creating stock record"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_records (id, product_id, branch_id, count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_id)
        .bind(&record.branch_id)
        .bind(record.count)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate(
                "stock record",
                format!("{}@{}", record.product_id, record.branch_id),
            ),
            other => other,
        })?;

        Ok(record)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockRecord>> {
        let record = sqlx::query_as::<_, StockRecord>(&format!(
            "SELECT {COLUMNS} FROM stock_records WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists active stock records, filtered by product and/or branch.
    pub async fn list(&self, filter: &StockFilter, params: &ListParams) -> DbResult<Page<StockRecord>> {
        debug!(?filter, page = params.page, "Listing stock records");

        let items = sqlx::query_as::<_, StockRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM stock_records
            WHERE deleted_at IS NULL
              AND (?1 IS NULL OR product_id = ?1)
              AND (?2 IS NULL OR branch_id = ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(filter.product_id.as_deref())
        .bind(filter.branch_id.as_deref())
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM stock_records
            WHERE deleted_at IS NULL
              AND (?1 IS NULL OR product_id = ?1)
              AND (?2 IS NULL OR branch_id = ?2)
            "#,
        )
        .bind(filter.product_id.as_deref())
        .bind(filter.branch_id.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    /// Replaces a stock record (inventory correction).
    pub async fn update(&self, id: &str, input: &NewStockRecord) -> DbResult<StockRecord> {
        input.validate()?;

        debug!(id = %id, count = input.count, "Updating stock record");

        let result = sqlx::query(
            r#"
            UPDATE stock_records
            SET product_id = ?2, branch_id = ?3, count = ?4, updated_at = ?5
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&input.product_id)
        .bind(&input.branch_id)
        .bind(input.count)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock record", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Stock record", id))
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting stock record");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE stock_records SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock record", id));
        }

        Ok(())
    }

    /// Summed on-hand count of a product at a branch.
    pub async fn available(&self, product_id: &str, branch_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        available(&mut conn, product_id, branch_id).await
    }

    /// Summed on-hand counts of every product stocked at a branch.
    pub async fn branch_counts(&self, branch_id: &str) -> DbResult<HashMap<String, i64>> {
        let mut conn = self.pool.acquire().await?;
        branch_counts(&mut conn, branch_id).await
    }
}

// =============================================================================
// Connection-level queries (shared with checkout)
// =============================================================================

pub(crate) async fn available(
    conn: &mut SqliteConnection,
    product_id: &str,
    branch_id: &str,
) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(count), 0) FROM stock_records
        WHERE product_id = ?1 AND branch_id = ?2 AND deleted_at IS NULL
        "#,
    )
    .bind(product_id)
    .bind(branch_id)
    .fetch_one(conn)
    .await?;

    Ok(total)
}

pub(crate) async fn branch_counts(
    conn: &mut SqliteConnection,
    branch_id: &str,
) -> DbResult<HashMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT product_id, COALESCE(SUM(count), 0) FROM stock_records
        WHERE branch_id = ?1 AND deleted_at IS NULL
        GROUP BY product_id
        "#,
    )
    .bind(branch_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Writes the settled count for a (product, branch) pair.
pub(crate) async fn set_count(
    conn: &mut SqliteConnection,
    product_id: &str,
    branch_id: &str,
    count: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_records SET count = ?3, updated_at = ?4
        WHERE product_id = ?1 AND branch_id = ?2 AND deleted_at IS NULL
        "#,
    )
    .bind(product_id)
    .bind(branch_id)
    .bind(count)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(
            "Stock record",
            format!("{product_id}@{branch_id}"),
        ));
    }

    Ok(())
}
