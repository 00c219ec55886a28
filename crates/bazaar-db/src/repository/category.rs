//! # Category Repository
//!
//! Database operations for product categories. Categories nest through
//! `parent_id`.

use bazaar_core::{Category, ListParams, NewCategory, Page, ValidationError};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, name, parent_id, created_at, updated_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, input: &NewCategory) -> DbResult<Category> {
        input.validate()?;

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            name: input.name.trim().to_string(),
            parent_id: input.parent_id.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, parent_id = ?category.parent_id, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, parent_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.parent_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {COLUMNS} FROM categories WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists active categories by name.
    pub async fn list(&self, params: &ListParams) -> DbResult<Page<Category>> {
        let pattern = like_pattern(params.search.as_deref());

        let items = sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {COLUMNS} FROM categories
            WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1)
            ORDER BY name
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(pattern.as_deref())
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    pub async fn update(&self, id: &str, input: &NewCategory) -> DbResult<Category> {
        input.validate()?;

        if input.parent_id.as_deref() == Some(id) {
            return Err(ValidationError::InvalidFormat {
                field: "parent_id".to_string(),
                reason: "a category cannot be its own parent".to_string(),
            }
            .into());
        }

        debug!(id = %id, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?2, parent_id = ?3, updated_at = ?4
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.parent_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting category");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}
