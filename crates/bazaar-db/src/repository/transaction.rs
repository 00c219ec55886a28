//! # Money Transaction Repository
//!
//! Balance movements for staff: bonus payouts, sales commissions and
//! withdrawals. Listing filters by an inclusive amount range and orders by
//! amount, newest first within one amount.

use bazaar_core::{AmountRange, ListParams, MoneyTransaction, NewMoneyTransaction, Page};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::new_id;
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, sale_id, staff_id, transaction_type, source_type, amount_cents, \
                       description, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn create(&self, input: &NewMoneyTransaction) -> DbResult<MoneyTransaction> {
        input.validate()?;

        let now = Utc::now();
        let transaction = MoneyTransaction {
            id: new_id(),
            sale_id: input.sale_id.clone(),
            staff_id: input.staff_id.clone(),
            transaction_type: input.transaction_type,
            source_type: input.source_type,
            amount_cents: input.amount_cents,
            description: input.description.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %transaction.id,
            staff_id = %transaction.staff_id,
            amount_cents = transaction.amount_cents,
            "Recording money transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO money_transactions (
                id, sale_id, staff_id, transaction_type, source_type, amount_cents,
                description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.sale_id)
        .bind(&transaction.staff_id)
        .bind(transaction.transaction_type)
        .bind(transaction.source_type)
        .bind(transaction.amount_cents)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(transaction)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MoneyTransaction>> {
        let transaction = sqlx::query_as::<_, MoneyTransaction>(&format!(
            "SELECT {COLUMNS} FROM money_transactions WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Lists transactions whose amount lies within `range` (both ends inclusive).
    pub async fn list(&self, range: &AmountRange, params: &ListParams) -> DbResult<Page<MoneyTransaction>> {
        debug!(?range, page = params.page, "Listing money transactions");

        let items = sqlx::query_as::<_, MoneyTransaction>(&format!(
            r#"
            SELECT {COLUMNS} FROM money_transactions
            WHERE deleted_at IS NULL
              AND (?1 IS NULL OR amount_cents >= ?1)
              AND (?2 IS NULL OR amount_cents <= ?2)
            ORDER BY amount_cents ASC, created_at DESC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(range.from_cents)
        .bind(range.to_cents)
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM money_transactions
            WHERE deleted_at IS NULL
              AND (?1 IS NULL OR amount_cents >= ?1)
              AND (?2 IS NULL OR amount_cents <= ?2)
            "#,
        )
        .bind(range.from_cents)
        .bind(range.to_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    pub async fn update(&self, id: &str, input: &NewMoneyTransaction) -> DbResult<MoneyTransaction> {
        input.validate()?;

        debug!(id = %id, "Updating money transaction");

        let result = sqlx::query(
            r#"
            UPDATE money_transactions
            SET sale_id = ?2, staff_id = ?3, transaction_type = ?4, source_type = ?5,
                amount_cents = ?6, description = ?7, updated_at = ?8
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&input.sale_id)
        .bind(&input.staff_id)
        .bind(input.transaction_type)
        .bind(input.source_type)
        .bind(input.amount_cents)
        .bind(input.description.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting money transaction");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE money_transactions SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }
}
