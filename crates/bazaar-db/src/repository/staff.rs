//! # Staff Repository
//!
//! Database operations for staff members.
//!
//! ## Passwords
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create           password ──► Argon2id (random salt) ──► password_hash │
//! │  change_password  verify(old, hash)?  ──► hash(new) ──► password_hash   │
//! │                   mismatch ──► CoreError::PasswordMismatch              │
//! │                                                                         │
//! │  The PHC string keeps algorithm, params and salt together, so hashes    │
//! │  stay verifiable if the defaults change.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use bazaar_core::{CoreError, ListParams, NewStaff, Page, PasswordChange, Staff, StaffUpdate};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, branch_id, tariff_id, staff_type, name, balance_cents, birth_date, \
                       login, password_hash, created_at, updated_at";

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Creates a staff member, storing only the Argon2 hash of the password.
    pub async fn create(&self, input: &NewStaff) -> DbResult<Staff> {
        input.validate()?;

        let now = Utc::now();
        let staff = Staff {
            id: new_id(),
            branch_id: input.branch_id.clone(),
            tariff_id: input.tariff_id.clone(),
            staff_type: input.staff_type,
            name: input.name.trim().to_string(),
            balance_cents: input.balance_cents,
            birth_date: input.birth_date,
            login: input.login.trim().to_string(),
            password_hash: hash_password(&input.password)?,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %staff.id, login = %staff.login, staff_type = ?staff.staff_type, "Creating staff");

        sqlx::query(
            r#"
            INSERT INTO staff (
                id, branch_id, tariff_id, staff_type, name, balance_cents, birth_date,
                login, password_hash, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.branch_id)
        .bind(&staff.tariff_id)
        .bind(staff.staff_type)
        .bind(&staff.name)
        .bind(staff.balance_cents)
        .bind(staff.birth_date)
        .bind(&staff.login)
        .bind(&staff.password_hash)
        .bind(staff.created_at)
        .bind(staff.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("login", &staff.login),
            other => other,
        })?;

        Ok(staff)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {COLUMNS} FROM staff WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Lists active staff, matching name or login.
    pub async fn list(&self, params: &ListParams) -> DbResult<Page<Staff>> {
        let pattern = like_pattern(params.search.as_deref());

        debug!(page = params.page, search = ?params.search, "Listing staff");

        let items = sqlx::query_as::<_, Staff>(&format!(
            r#"
            SELECT {COLUMNS} FROM staff
            WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1 OR login LIKE ?1)
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
            r#"
            SELECT COUNT(*) FROM staff
            WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1 OR login LIKE ?1)
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Page { items, count })
    }

    /// Updates everything except the password.
    pub async fn update(&self, id: &str, input: &StaffUpdate) -> DbResult<Staff> {
        input.validate()?;

        debug!(id = %id, "Updating staff");

        let login = input.login.trim();
        let result = sqlx::query(
            r#"
            UPDATE staff
            SET branch_id = ?2, tariff_id = ?3, staff_type = ?4, name = ?5,
                balance_cents = ?6, birth_date = ?7, login = ?8, updated_at = ?9
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&input.branch_id)
        .bind(&input.tariff_id)
        .bind(input.staff_type)
        .bind(input.name.trim())
        .bind(input.balance_cents)
        .bind(input.birth_date)
        .bind(login)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("login", login),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Staff", id))
    }

    /// Replaces the password after checking the old one.
    pub async fn change_password(&self, id: &str, input: &PasswordChange) -> DbResult<()> {
        input.validate()?;

        let staff = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Staff", id))?;

        if !verify_password(&input.old_password, &staff.password_hash) {
            return Err(CoreError::PasswordMismatch.into());
        }

        let hash = hash_password(&input.new_password)?;

        let result = sqlx::query(
            "UPDATE staff SET password_hash = ?2, updated_at = ?3 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(&hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        info!(id = %id, "Staff password changed");
        Ok(())
    }

    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting staff");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE staff SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Hashes a password for storage (PHC string).
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
