//! # User Repository
//!
//! Staff accounts and their per-head commission rates.
//!
//! Staff are never deleted: bookings and commissions keep pointing at them,
//! so removal only deactivates the account.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, like_pattern};
use tripdesk_core::{ListParams, NewUser, User, UserUpdate};

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a staff member.
    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        new.validate()?;

        let now = Utc::now();
        let user = User {
            id: generate_id(),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            role: new.role,
            commission_per_head_cents: new.commission_per_head_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, role, commission_per_head_cents,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.commission_per_head_cents)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&user.email))?;

        info!(user_id = %user.id, role = ?user.role, "Staff member created");
        Ok(user)
    }

    /// Gets a staff member by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        find_user(&mut conn, id).await
    }

    /// Lists staff, active first, optionally filtered by name or email.
    pub async fn list(&self, params: &ListParams) -> DbResult<Vec<User>> {
        let pattern = like_pattern(params.search()?);
        let (limit, offset) = params.page();

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT
                id, name, email, role, commission_per_head_cents,
                is_active, created_at, updated_at
            FROM users
            WHERE ?1 IS NULL OR name LIKE ?1 OR email LIKE ?1
            ORDER BY is_active DESC, name
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Applies a partial update.
    ///
    /// A rate change only affects commissions created afterwards.
    pub async fn update(&self, id: &str, update: UserUpdate) -> DbResult<User> {
        update.validate()?;

        let mut user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(rate) = update.commission_per_head_cents {
            user.commission_per_head_cents = Some(rate);
        }
        if let Some(active) = update.is_active {
            user.is_active = active;
        }
        user.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                email = ?3,
                role = ?4,
                commission_per_head_cents = ?5,
                is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.commission_per_head_cents)
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&user.email))?;

        info!(user_id = %user.id, "Staff member updated");
        Ok(user)
    }

    /// Deactivates a staff member.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(user_id = %id, "Staff member deactivated");
        Ok(())
    }
}

/// Loads a staff member on an open connection or transaction.
pub(crate) async fn find_user(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT
            id, name, email, role, commission_per_head_cents,
            is_active, created_at, updated_at
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use tripdesk_core::UserRole;

    #[tokio::test]
    async fn test_insert_and_update_rate() {
        let db = test_db().await;
        let ayla = sales_user(&db, "Ayla").await;
        assert_eq!(ayla.email, "ayla@agency.example");
        assert_eq!(ayla.commission_rate().map(|m| m.cents()), Some(15_000));

        let updated = db
            .users()
            .update(
                &ayla.id,
                UserUpdate {
                    commission_per_head_cents: Some(20_000),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.commission_per_head_cents, Some(20_000));

        let loaded = db.users().get_by_id(&ayla.id).await.unwrap().unwrap();
        assert_eq!(loaded.role, UserRole::Sales);
        assert_eq!(loaded.commission_per_head_cents, Some(20_000));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = test_db().await;
        sales_user(&db, "Ayla").await;

        let err = db
            .users()
            .insert(&NewUser {
                name: "Ayla Again".to_string(),
                email: "AYLA@agency.example".to_string(),
                role: UserRole::Operations,
                commission_per_head_cents: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_keeps_record() {
        let db = test_db().await;
        let ayla = sales_user(&db, "Ayla").await;

        db.users().deactivate(&ayla.id).await.unwrap();

        let loaded = db.users().get_by_id(&ayla.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
        assert!(loaded.commission_rate().is_none());

        let listed = db.users().list(&ListParams::default()).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(matches!(
            db.users().deactivate("missing").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
