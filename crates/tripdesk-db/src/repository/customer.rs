//! # Customer Repository
//!
//! Database operations for customer profiles.
//!
//! Customers are referenced by bookings and companion links, so a customer
//! with bookings cannot be deleted.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, like_pattern, non_blank};
use tripdesk_core::{CoreError, Customer, CustomerUpdate, ListParams, NewCustomer};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    ///
    /// ## Errors
    /// - `Core(Validation)` for missing names or a malformed email
    /// - `UniqueViolation` when the email is already used
    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        new.validate()?;

        let mut conn = self.pool.acquire().await?;
        let customer = insert_customer(&mut conn, new).await?;

        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, first_name, last_name, email, phone, passport_number,
                date_of_birth, notes, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers, optionally filtered by a search over name and email.
    pub async fn list(&self, params: &ListParams) -> DbResult<Vec<Customer>> {
        let pattern = like_pattern(params.search()?);
        let (limit, offset) = params.page();

        debug!(search = ?pattern, limit, offset, "Listing customers");

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT
                id, first_name, last_name, email, phone, passport_number,
                date_of_birth, notes, created_at, updated_at
            FROM customers
            WHERE ?1 IS NULL
               OR first_name LIKE ?1
               OR last_name LIKE ?1
               OR (first_name || ' ' || last_name) LIKE ?1
               OR email LIKE ?1
               OR passport_number LIKE ?1
            ORDER BY last_name, first_name
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Applies a partial update. Blank optional fields are cleared.
    pub async fn update(&self, id: &str, update: CustomerUpdate) -> DbResult<Customer> {
        update.validate()?;

        let mut customer = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        if let Some(first_name) = update.first_name {
            customer.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = update.last_name {
            customer.last_name = last_name.trim().to_string();
        }
        if update.email.is_some() {
            customer.email = non_blank(update.email);
        }
        if update.phone.is_some() {
            customer.phone = non_blank(update.phone);
        }
        if update.passport_number.is_some() {
            customer.passport_number = non_blank(update.passport_number);
        }
        if update.date_of_birth.is_some() {
            customer.date_of_birth = update.date_of_birth;
        }
        if update.notes.is_some() {
            customer.notes = non_blank(update.notes);
        }
        customer.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE customers SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                passport_number = ?6,
                date_of_birth = ?7,
                notes = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.passport_number)
        .bind(customer.date_of_birth)
        .bind(&customer.notes)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(customer.email.clone().unwrap_or_default()))?;

        info!(customer_id = %customer.id, "Customer updated");
        Ok(customer)
    }

    /// Deletes a customer without bookings.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown ID
    /// - `Core(StillReferenced)` when bookings or companion links point at
    ///   the customer
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let references: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM bookings WHERE customer_id = ?1)
              + (SELECT COUNT(*) FROM booking_companions WHERE companion_customer_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if references > 0 {
            return Err(CoreError::StillReferenced {
                entity: "Customer".to_string(),
                id: id.to_string(),
                dependents: format!("{references} booking record(s)"),
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        tx.commit().await?;

        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    /// Counts customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts a customer on an open connection or transaction.
///
/// Callers validate first; lead conversion relaxes the last-name rule.
pub(crate) async fn insert_customer(
    conn: &mut SqliteConnection,
    new: &NewCustomer,
) -> DbResult<Customer> {
    let now = Utc::now();
    let customer = Customer {
        id: generate_id(),
        first_name: new.first_name.trim().to_string(),
        last_name: new.last_name.trim().to_string(),
        email: non_blank(new.email.clone()),
        phone: non_blank(new.phone.clone()),
        passport_number: non_blank(new.passport_number.clone()),
        date_of_birth: new.date_of_birth,
        notes: non_blank(new.notes.clone()),
        created_at: now,
        updated_at: now,
    };

    debug!(customer_id = %customer.id, "Inserting customer");

    sqlx::query(
        r#"
        INSERT INTO customers (
            id, first_name, last_name, email, phone, passport_number,
            date_of_birth, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.passport_number)
    .bind(customer.date_of_birth)
    .bind(&customer.notes)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_value(customer.email.clone().unwrap_or_default()))?;

    Ok(customer)
}

/// Fails with `NotFound` unless the customer exists.
pub(crate) async fn ensure_customer_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    exists
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("Customer", id))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use tripdesk_core::PaymentRatio;

    #[tokio::test]
    async fn test_insert_get_and_search() {
        let db = test_db().await;
        let deniz = customer(&db, "Deniz").await;
        customer(&db, "Elif").await;

        let loaded = db.customers().get_by_id(&deniz.id).await.unwrap().unwrap();
        assert_eq!(loaded.full_name(), "Deniz Yilmaz");

        let found = db
            .customers()
            .list(&ListParams {
                q: Some("deniz".to_string()),
                ..ListParams::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, deniz.id);

        let all = db.customers().list(&ListParams::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = test_db().await;
        customer(&db, "Deniz").await;

        let err = db
            .customers()
            .insert(&NewCustomer {
                first_name: "Other".to_string(),
                last_name: "Person".to_string(),
                email: Some("deniz@example.com".to_string()),
                ..NewCustomer::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "deniz@example.com"));
    }

    #[tokio::test]
    async fn test_update_clears_blank_fields() {
        let db = test_db().await;
        let deniz = customer(&db, "Deniz").await;

        let updated = db
            .customers()
            .update(
                &deniz.id,
                CustomerUpdate {
                    email: Some("  ".to_string()),
                    phone: Some("+90 555 000 00 00".to_string()),
                    ..CustomerUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, None);
        assert_eq!(updated.phone.as_deref(), Some("+90 555 000 00 00"));

        let err = db
            .customers()
            .update("missing", CustomerUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_refuses_booked_customer() {
        let db = test_db().await;
        let trip = trip(&db, "IST-01").await;
        let booked = customer(&db, "Deniz").await;
        let free = customer(&db, "Elif").await;

        db.bookings()
            .create_booking(booking_request(&trip, &booked, PaymentRatio::Full, 1_020_000))
            .await
            .unwrap();

        let err = db.customers().delete(&booked.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::StillReferenced { .. })));

        db.customers().delete(&free.id).await.unwrap();
        assert!(db.customers().get_by_id(&free.id).await.unwrap().is_none());
        assert_eq!(db.customers().count().await.unwrap(), 1);
    }
}
