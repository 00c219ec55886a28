//! # Ledger Repository
//!
//! The stock movement ledger. Entries are append-only: there is no update
//! and no delete. Settlement appends one `minus` entry per basket line;
//! goods receipts are appended directly as `plus` entries.

use bazaar_core::{LedgerDraft, LedgerEntry, LedgerFilter, ListParams, Money, NewLedgerEntry, Page};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::new_id;
use crate::error::DbResult;

const COLUMNS: &str = "id, staff_id, product_id, direction, price_cents, quantity, created_at";

/// Repository for ledger entries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends an entry.
    pub async fn create(&self, input: &NewLedgerEntry) -> DbResult<LedgerEntry> {
        input.validate()?;

        let draft = LedgerDraft {
            staff_id: input.staff_id.clone(),
            product_id: input.product_id.clone(),
            direction: input.direction,
            price: Money::from_cents(input.price_cents),
            quantity: input.quantity,
        };

        let mut conn = self.pool.acquire().await?;
        insert_entry(&mut conn, &draft).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LedgerEntry>> {
        let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
            "SELECT {COLUMNS} FROM ledger_entries WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lists entries in the order they were written.
    pub async fn list(&self, filter: &LedgerFilter, params: &ListParams) -> DbResult<Page<LedgerEntry>> {
        debug!(?filter, page = params.page, "Listing ledger entries");

        let items = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {COLUMNS} FROM ledger_entries
            WHERE (?1 IS NULL OR product_id = ?1)
              AND (?2 IS NULL OR staff_id = ?2)
            ORDER BY created_at, rowid
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(filter.product_id.as_deref())
        .bind(filter.staff_id.as_deref())
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM ledger_entries
            WHERE (?1 IS NULL OR product_id = ?1)
              AND (?2 IS NULL OR staff_id = ?2)
            "#,
        )
        .bind(filter.product_id.as_deref())
        .bind(filter.staff_id.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }
}

pub(crate) async fn insert_entry(conn: &mut SqliteConnection, draft: &LedgerDraft) -> DbResult<LedgerEntry> {
    let entry = LedgerEntry {
        id: new_id(),
        staff_id: draft.staff_id.clone(),
        product_id: draft.product_id.clone(),
        direction: draft.direction,
        price_cents: draft.price.cents(),
        quantity: draft.quantity,
        created_at: Utc::now(),
    };

    debug!(
        product_id = %entry.product_id,
        direction = ?entry.direction,
        quantity = entry.quantity,
        "Appending ledger entry"
    );

    sqlx::query(
        r#"
        INSERT INTO ledger_entries (id, staff_id, product_id, direction, price_cents, quantity, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.staff_id)
    .bind(&entry.product_id)
    .bind(entry.direction)
    .bind(entry.price_cents)
    .bind(entry.quantity)
    .bind(entry.created_at)
    .execute(conn)
    .await?;

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::DbError;
    use bazaar_core::LedgerDirection;

    #[tokio::test]
    async fn test_receipt_entries_in_write_order() {
        let shop = fixtures::shop().await;
        let tea = shop.product("6001", 100).await;
        let repo = shop.db.ledger();

        for quantity in [3, 1, 2] {
            repo.create(&NewLedgerEntry {
                staff_id: shop.cashier_id.clone(),
                product_id: tea.id.clone(),
                direction: LedgerDirection::Plus,
                price_cents: 100 * quantity,
                quantity,
            })
            .await
            .unwrap();
        }

        let filter = LedgerFilter {
            product_id: Some(tea.id.clone()),
            staff_id: None,
        };
        let page = repo.list(&filter, &ListParams::default()).await.unwrap();
        let quantities: Vec<i64> = page.items.iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![3, 1, 2]);

        let first = repo.get_by_id(&page.items[0].id).await.unwrap().unwrap();
        assert_eq!(first.direction, LedgerDirection::Plus);
        assert_eq!(first.price().cents(), 300);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let shop = fixtures::shop().await;
        let tea = shop.product("6002", 100).await;

        let err = shop
            .db
            .ledger()
            .create(&NewLedgerEntry {
                staff_id: shop.cashier_id.clone(),
                product_id: tea.id.clone(),
                direction: LedgerDirection::Plus,
                price_cents: 0,
                quantity: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
