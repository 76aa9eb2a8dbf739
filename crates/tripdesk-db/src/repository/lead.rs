//! # Lead Repository
//!
//! The sales pipeline: prospective customers, who follows them up, and the
//! conversion into a customer record.
//!
//! ## Pipeline
//! ```text
//! new ──► contacted ──► qualified ──► converted   (convert_to_customer only)
//!  │          │             │
//!  └──────────┴─────────────┴──────► lost
//! ```
//!
//! `converted` is final and can only be reached through conversion, which
//! creates the customer in the same transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::customer::insert_customer;
use crate::repository::{generate_id, like_pattern, non_blank};
use tripdesk_core::input::{page, search_text};
use tripdesk_core::validation::validate_name;
use tripdesk_core::{
    CoreError, Customer, Lead, LeadFilter, LeadStatus, LeadUpdate, NewCustomer, NewLead,
    ValidationError,
};

/// Result of converting a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadConversion {
    pub lead: Lead,
    pub customer: Customer,
}

/// Repository for lead database operations.
#[derive(Debug, Clone)]
pub struct LeadRepository {
    pool: SqlitePool,
}

impl LeadRepository {
    /// Creates a new LeadRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LeadRepository { pool }
    }

    /// Inserts a new lead in status `new`.
    pub async fn insert(&self, new: &NewLead) -> DbResult<Lead> {
        new.validate()?;

        let now = Utc::now();
        let lead = Lead {
            id: generate_id(),
            full_name: new.full_name.trim().to_string(),
            email: non_blank(new.email.clone()),
            phone: non_blank(new.phone.clone()),
            source: non_blank(new.source.clone()),
            status: LeadStatus::New,
            trip_id: non_blank(new.trip_id.clone()),
            assigned_user_id: non_blank(new.assigned_user_id.clone()),
            customer_id: None,
            notes: non_blank(new.notes.clone()),
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        write_lead(&mut conn, &lead, true).await?;

        info!(lead_id = %lead.id, source = ?lead.source, "Lead created");
        Ok(lead)
    }

    /// Gets a lead by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Lead>> {
        let mut conn = self.pool.acquire().await?;
        find_lead(&mut conn, id).await
    }

    /// Lists leads, newest first.
    pub async fn list(&self, filter: &LeadFilter) -> DbResult<Vec<Lead>> {
        let pattern = like_pattern(search_text(filter.q.as_deref())?);
        let (limit, offset) = page(filter.limit, filter.offset);

        debug!(status = ?filter.status, search = ?pattern, limit, offset, "Listing leads");

        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT
                id, full_name, email, phone, source, status, trip_id,
                assigned_user_id, customer_id, notes, created_at, updated_at
            FROM leads
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR assigned_user_id = ?2)
              AND (?3 IS NULL OR trip_id = ?3)
              AND (?4 IS NULL OR full_name LIKE ?4 OR email LIKE ?4 OR phone LIKE ?4)
            ORDER BY created_at DESC
            LIMIT ?5 OFFSET ?6
            "#,
        )
        .bind(filter.status)
        .bind(filter.assigned_user_id.as_deref())
        .bind(filter.trip_id.as_deref())
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    /// Applies a partial update. Blank optional fields are cleared.
    pub async fn update(&self, id: &str, update: LeadUpdate) -> DbResult<Lead> {
        update.validate()?;

        let mut conn = self.pool.acquire().await?;
        let mut lead = find_lead(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Lead", id))?;

        if let Some(status) = update.status {
            check_status_change(&lead, status)?;
            lead.status = status;
        }
        if let Some(full_name) = update.full_name {
            lead.full_name = full_name.trim().to_string();
        }
        if update.email.is_some() {
            lead.email = non_blank(update.email);
        }
        if update.phone.is_some() {
            lead.phone = non_blank(update.phone);
        }
        if update.source.is_some() {
            lead.source = non_blank(update.source);
        }
        if update.trip_id.is_some() {
            lead.trip_id = non_blank(update.trip_id);
        }
        if update.assigned_user_id.is_some() {
            lead.assigned_user_id = non_blank(update.assigned_user_id);
        }
        if update.notes.is_some() {
            lead.notes = non_blank(update.notes);
        }
        lead.updated_at = Utc::now();

        write_lead(&mut conn, &lead, false).await?;

        info!(lead_id = %lead.id, status = ?lead.status, "Lead updated");
        Ok(lead)
    }

    /// Moves a lead along the pipeline.
    ///
    /// ## Errors
    /// - `Core(LeadAlreadyConverted)` for a converted lead
    /// - `Core(Validation)` when asked for `converted` directly
    pub async fn update_status(&self, id: &str, status: LeadStatus) -> DbResult<Lead> {
        self.update(
            id,
            LeadUpdate {
                status: Some(status),
                ..LeadUpdate::default()
            },
        )
        .await
    }

    /// Deletes a lead. A customer created from it stays.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lead", id));
        }

        info!(lead_id = %id, "Lead deleted");
        Ok(())
    }

    /// Turns a lead into a customer.
    ///
    /// The first word of the lead's name becomes the first name, the rest
    /// the last name (possibly empty). Email, phone and notes carry over.
    ///
    /// ## Errors
    /// - `Core(LeadAlreadyConverted)` on a second conversion
    /// - `UniqueViolation` when a customer already uses the email
    pub async fn convert_to_customer(&self, id: &str) -> DbResult<LeadConversion> {
        let mut tx = self.pool.begin().await?;

        let mut lead = find_lead(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Lead", id))?;

        if lead.status == LeadStatus::Converted || lead.customer_id.is_some() {
            return Err(CoreError::LeadAlreadyConverted(lead.id).into());
        }

        let (first_name, last_name) = lead.split_name();
        validate_name("first_name", &first_name)?;

        let customer = insert_customer(
            &mut tx,
            &NewCustomer {
                first_name,
                last_name,
                email: lead.email.clone(),
                phone: lead.phone.clone(),
                notes: lead.notes.clone(),
                ..NewCustomer::default()
            },
        )
        .await?;

        lead.status = LeadStatus::Converted;
        lead.customer_id = Some(customer.id.clone());
        lead.updated_at = Utc::now();
        write_lead(&mut tx, &lead, false).await?;

        tx.commit().await?;

        info!(lead_id = %lead.id, customer_id = %customer.id, "Lead converted");
        Ok(LeadConversion { lead, customer })
    }
}

fn check_status_change(lead: &Lead, next: LeadStatus) -> DbResult<()> {
    if next == lead.status {
        return Ok(());
    }
    if lead.status == LeadStatus::Converted {
        return Err(CoreError::LeadAlreadyConverted(lead.id.clone()).into());
    }
    if next == LeadStatus::Converted {
        return Err(ValidationError::invalid("status", "leads are converted through conversion").into());
    }
    Ok(())
}

async fn find_lead(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Lead>> {
    let lead = sqlx::query_as::<_, Lead>(
        r#"
        SELECT
            id, full_name, email, phone, source, status, trip_id,
            assigned_user_id, customer_id, notes, created_at, updated_at
        FROM leads
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(lead)
}

/// Inserts or rewrites every column of a lead.
async fn write_lead(conn: &mut SqliteConnection, lead: &Lead, insert: bool) -> DbResult<()> {
    let sql = if insert {
        r#"
        INSERT INTO leads (
            id, full_name, email, phone, source, status, trip_id,
            assigned_user_id, customer_id, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#
    } else {
        r#"
        UPDATE leads SET
            full_name = ?2,
            email = ?3,
            phone = ?4,
            source = ?5,
            status = ?6,
            trip_id = ?7,
            assigned_user_id = ?8,
            customer_id = ?9,
            notes = ?10,
            created_at = ?11,
            updated_at = ?12
        WHERE id = ?1
        "#
    };

    sqlx::query(sql)
        .bind(&lead.id)
        .bind(&lead.full_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.source)
        .bind(lead.status)
        .bind(&lead.trip_id)
        .bind(&lead.assigned_user_id)
        .bind(&lead.customer_id)
        .bind(&lead.notes)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;

    fn new_lead(name: &str) -> NewLead {
        NewLead {
            full_name: name.to_string(),
            email: Some(format!("{}@mail.example", name.split_whitespace().next().unwrap_or("x").to_lowercase())),
            phone: Some("+90 555 111 22 33".to_string()),
            source: Some("website".to_string()),
            ..NewLead::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_filter() {
        let db = test_db().await;
        let trip = trip(&db, "IST-01").await;
        let ayla = sales_user(&db, "Ayla").await;

        let mut request = new_lead("Ayşe Nur Demir");
        request.trip_id = Some(trip.id.clone());
        request.assigned_user_id = Some(ayla.id.clone());
        let ayse = db.leads().insert(&request).await.unwrap();
        assert_eq!(ayse.status, LeadStatus::New);

        let kemal = db.leads().insert(&new_lead("Kemal Kaya")).await.unwrap();
        db.leads()
            .update_status(&kemal.id, LeadStatus::Contacted)
            .await
            .unwrap();

        let assigned = db
            .leads()
            .list(&LeadFilter {
                assigned_user_id: Some(ayla.id.clone()),
                ..LeadFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, ayse.id);

        let contacted = db
            .leads()
            .list(&LeadFilter {
                status: Some(LeadStatus::Contacted),
                ..LeadFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(contacted.len(), 1);
        assert_eq!(contacted[0].id, kemal.id);

        let searched = db
            .leads()
            .list(&LeadFilter {
                q: Some("nur".to_string()),
                ..LeadFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
    }

    #[tokio::test]
    async fn test_convert_to_customer() {
        let db = test_db().await;
        let lead = db.leads().insert(&new_lead("Ayşe Nur Demir")).await.unwrap();

        let converted = db.leads().convert_to_customer(&lead.id).await.unwrap();
        assert_eq!(converted.lead.status, LeadStatus::Converted);
        assert_eq!(converted.lead.customer_id.as_deref(), Some(converted.customer.id.as_str()));
        assert_eq!(converted.customer.first_name, "Ayşe");
        assert_eq!(converted.customer.last_name, "Nur Demir");
        assert_eq!(converted.customer.email, lead.email);

        let stored = db.customers().get_by_id(&converted.customer.id).await.unwrap();
        assert!(stored.is_some());

        let err = db.leads().convert_to_customer(&lead.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::LeadAlreadyConverted(_))));

        let err = db
            .leads()
            .update_status(&lead.id, LeadStatus::Lost)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::LeadAlreadyConverted(_))));
    }

    #[tokio::test]
    async fn test_single_word_name_converts() {
        let db = test_db().await;
        let lead = db
            .leads()
            .insert(&NewLead {
                full_name: "Tarkan".to_string(),
                ..NewLead::default()
            })
            .await
            .unwrap();

        let converted = db.leads().convert_to_customer(&lead.id).await.unwrap();
        assert_eq!(converted.customer.first_name, "Tarkan");
        assert_eq!(converted.customer.last_name, "");
    }

    #[tokio::test]
    async fn test_failed_conversion_rolls_back() {
        let db = test_db().await;
        customer(&db, "Deniz").await;

        let lead = db
            .leads()
            .insert(&NewLead {
                full_name: "Deniz Other".to_string(),
                email: Some("deniz@example.com".to_string()),
                ..NewLead::default()
            })
            .await
            .unwrap();

        let err = db.leads().convert_to_customer(&lead.id).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let unchanged = db.leads().get_by_id(&lead.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, LeadStatus::New);
        assert!(unchanged.customer_id.is_none());
        assert_eq!(db.customers().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_status_rules_and_delete() {
        let db = test_db().await;
        let lead = db.leads().insert(&new_lead("Kemal Kaya")).await.unwrap();

        let err = db
            .leads()
            .update_status(&lead.id, LeadStatus::Converted)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let lost = db.leads().update_status(&lead.id, LeadStatus::Lost).await.unwrap();
        assert_eq!(lost.status, LeadStatus::Lost);

        db.leads().delete(&lead.id).await.unwrap();
        assert!(db.leads().get_by_id(&lead.id).await.unwrap().is_none());
        assert!(matches!(
            db.leads().delete(&lead.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
