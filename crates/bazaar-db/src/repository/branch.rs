//! # Branch Repository
//!
//! Database operations for shop branches.

use bazaar_core::{Branch, ListParams, NewBranch, Page};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, name, address, created_at, updated_at";

/// Repository for branch database operations.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    pub async fn create(&self, input: &NewBranch) -> DbResult<Branch> {
        input.validate()?;

        let now = Utc::now();
        let branch = Branch {
            id: new_id(),
            name: input.name.trim().to_string(),
            address: input.address.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %branch.id, name = %branch.name, "Creating branch");

        sqlx::query(
            r#"
            INSERT INTO branches (id, name, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(branch.created_at)
        .bind(branch.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Gets an active branch by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>(&format!(
            "SELECT {COLUMNS} FROM branches WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Lists active branches, newest first, optionally filtered by name.
    pub async fn list(&self, params: &ListParams) -> DbResult<Page<Branch>> {
        let pattern = like_pattern(params.search.as_deref());

        debug!(page = params.page, limit = params.limit, search = ?params.search, "Listing branches");

        let items = sqlx::query_as::<_, Branch>(&format!(
            r#"
            SELECT {COLUMNS} FROM branches
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
            "SELECT COUNT(*) FROM branches WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    pub async fn update(&self, id: &str, input: &NewBranch) -> DbResult<Branch> {
        input.validate()?;

        debug!(id = %id, "Updating branch");

        let result = sqlx::query(
            r#"
            UPDATE branches
            SET name = ?2, address = ?3, updated_at = ?4
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.address.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Branch", id))
    }

    /// Soft-deletes a branch.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting branch");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE branches SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        Ok(())
    }
}
