//! # Tariff Repository
//!
//! Database operations for staff tariffs (payout schemes for cash and card
//! sales).

use bazaar_core::{ListParams, NewStaffTariff, Page, StaffTariff};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};

const COLUMNS: &str =
    "id, name, tariff_type, amount_for_cash_cents, amount_for_card_cents, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct TariffRepository {
    pool: SqlitePool,
}

impl TariffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TariffRepository { pool }
    }

    pub async fn create(&self, input: &NewStaffTariff) -> DbResult<StaffTariff> {
        input.validate()?;

        let now = Utc::now();
        let tariff = StaffTariff {
            id: new_id(),
            name: input.name.trim().to_string(),
            tariff_type: input.tariff_type,
            amount_for_cash_cents: input.amount_for_cash_cents,
            amount_for_card_cents: input.amount_for_card_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %tariff.id, tariff_type = ?tariff.tariff_type, "Creating staff tariff");

        sqlx::query(
            r#"
            INSERT INTO staff_tariffs (
                id, name, tariff_type, amount_for_cash_cents, amount_for_card_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&tariff.id)
        .bind(&tariff.name)
        .bind(tariff.tariff_type)
        .bind(tariff.amount_for_cash_cents)
        .bind(tariff.amount_for_card_cents)
        .bind(tariff.created_at)
        .bind(tariff.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(tariff)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StaffTariff>> {
        let tariff = sqlx::query_as::<_, StaffTariff>(&format!(
            "SELECT {COLUMNS} FROM staff_tariffs WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tariff)
    }

    pub async fn list(&self, params: &ListParams) -> DbResult<Page<StaffTariff>> {
        let pattern = like_pattern(params.search.as_deref());

        let items = sqlx::query_as::<_, StaffTariff>(&format!(
            r#"
            SELECT {COLUMNS} FROM staff_tariffs
            WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1)
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
            "SELECT COUNT(*) FROM staff_tariffs WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    pub async fn update(&self, id: &str, input: &NewStaffTariff) -> DbResult<StaffTariff> {
        input.validate()?;

        debug!(id = %id, "Updating staff tariff");

        let result = sqlx::query(
            r#"
            UPDATE staff_tariffs
            SET name = ?2, tariff_type = ?3, amount_for_cash_cents = ?4,
                amount_for_card_cents = ?5, updated_at = ?6
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.tariff_type)
        .bind(input.amount_for_cash_cents)
        .bind(input.amount_for_card_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff tariff", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Staff tariff", id))
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting staff tariff");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE staff_tariffs SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff tariff", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::TariffType;

    #[tokio::test]
    async fn test_tariff_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tariffs();

        let tariff = repo
            .create(&NewStaffTariff {
                name: "Standard".to_string(),
                tariff_type: TariffType::Percent,
                amount_for_cash_cents: 300,
                amount_for_card_cents: 200,
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                &tariff.id,
                &NewStaffTariff {
                    name: "Flat".to_string(),
                    tariff_type: TariffType::Fixed,
                    amount_for_cash_cents: 5000,
                    amount_for_card_cents: 5000,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.tariff_type, TariffType::Fixed);

        assert_eq!(repo.list(&ListParams::default()).await.unwrap().count, 1);

        repo.soft_delete(&tariff.id).await.unwrap();
        assert!(repo.get_by_id(&tariff.id).await.unwrap().is_none());
        assert_eq!(repo.list(&ListParams::default()).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_rejects_negative_amount() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .tariffs()
            .create(&NewStaffTariff {
                name: "Broken".to_string(),
                tariff_type: TariffType::Fixed,
                amount_for_cash_cents: -1,
                amount_for_card_cents: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
