//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search = "4780001234567"  ──► exact barcode match                      │
//! │  search = "tea"            ──► name LIKE '%tea%' (ASCII case-insens.)   │
//! │  search = None             ──► every active product                     │
//! │                                                                         │
//! │  Both predicates are OR-ed, so a scanner and a keyboard hit the same    │
//! │  endpoint.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bazaar_core::{ListParams, NewProduct, Page, Product};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, name, price_cents, barcode, category_id, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let page = repo.list(&ListParams::default().with_search("tea")).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    ///
    /// Fails with `UniqueViolation` when an active product already uses the
    /// barcode.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            barcode: input.barcode.clone(),
            category_id: input.category_id.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, barcode = %product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, barcode, category_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.barcode)
        .bind(&product.category_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.barcode),
            other => other,
        })?;

        Ok(product)
    }

    /// Gets an active product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists active products by name, matching name substring or exact barcode.
    pub async fn list(&self, params: &ListParams) -> DbResult<Page<Product>> {
        let search = params.search.as_deref();
        let pattern = like_pattern(search);

        debug!(search = ?search, limit = params.limit, "Listing products");

        let items = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS} FROM products
            WHERE deleted_at IS NULL
              AND (?1 IS NULL OR name LIKE ?2 OR barcode = ?1)
            ORDER BY name
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(search)
        .bind(pattern.as_deref())
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE deleted_at IS NULL
              AND (?1 IS NULL OR name LIKE ?2 OR barcode = ?1)
            "#,
        )
        .bind(search)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        debug!(count, "Product list returned");
        Ok(Page { items, count })
    }

    /// Replaces a product's editable fields.
    ///
    /// Existing basket lines keep the price they were added at.
    pub async fn update(&self, id: &str, input: &NewProduct) -> DbResult<Product> {
        input.validate()?;

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_cents = ?3, barcode = ?4, category_id = ?5, updated_at = ?6
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.price_cents)
        .bind(&input.barcode)
        .bind(&input.category_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &input.barcode),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product.
    ///
    /// Historical basket lines and ledger entries still reference it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level queries (shared with checkout)
// =============================================================================

pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM products WHERE id = ?1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::CoreError;

    fn input(name: &str, barcode: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_cents: 1500,
            barcode: barcode.to_string(),
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_search_by_name_or_barcode() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.create(&input("Green Tea", "1001")).await.unwrap();
        repo.create(&input("Black Tea", "1002")).await.unwrap();
        repo.create(&input("Coffee", "1003")).await.unwrap();

        let by_name = repo.list(&ListParams::default().with_search("tea")).await.unwrap();
        assert_eq!(by_name.count, 2);

        let by_barcode = repo.list(&ListParams::default().with_search("1003")).await.unwrap();
        assert_eq!(by_barcode.count, 1);
        assert_eq!(by_barcode.items[0].name, "Coffee");

        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_barcode_unique_among_active_products() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let first = repo.create(&input("Water", "2001")).await.unwrap();
        let err = repo.create(&input("Water 2", "2001")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "2001"));

        // the barcode becomes free once the holder is deleted
        repo.soft_delete(&first.id).await.unwrap();
        assert!(repo.create(&input("Water 2", "2001")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_missing_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = repo.create(&input("Juice", "3001")).await.unwrap();
        let mut changed = input("Apple Juice", "3001");
        changed.price_cents = 1800;

        let updated = repo.update(&product.id, &changed).await.unwrap();
        assert_eq!(updated.name, "Apple Juice");
        assert_eq!(updated.price().cents(), 1800);

        let err = repo.update("missing", &changed).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_price_above_cap_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut huge = input("Gold Bar", "4001");
        huge.price_cents = i64::MAX / 2;
        let err = repo.create(&huge).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let product = repo.create(&input("Gold Bar", "4001")).await.unwrap();
        let err = repo.update(&product.id, &huge).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
