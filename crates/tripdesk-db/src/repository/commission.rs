//! # Commission Repository
//!
//! Commission records derived from booking payment-status transitions, and
//! the payout operations staff run on them.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Commission Lifecycle                                 │
//! │                                                                         │
//! │  booking → fully_paid      ──► INSERT (payable)   at most once         │
//! │  booking → partially_paid  ──► pending                                 │
//! │  booking → refunded        ──► cancelled                               │
//! │  staff   → mark_paid       ──► paid (frozen)                           │
//! │                                                                         │
//! │  UNIQUE (booking_id) backs "at most once" if two requests race.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::repository::user::find_user;
use tripdesk_core::commission::{
    decide_commission, decide_reassignment, CommissionDecision, SalesRate,
};
use tripdesk_core::input::page;
use tripdesk_core::{
    Booking, Commission, CommissionFilter, CommissionStatus, CommissionSummary, CoreError,
    PaymentStatus,
};

/// Repository for commission database operations.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    /// Creates a new CommissionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    /// Gets a commission by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Commission>> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, booking_id, user_id, amount_cents, status, created_at, updated_at, paid_at
            FROM commissions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(commission)
    }

    /// Gets the commission of a booking, if one was created.
    pub async fn get_for_booking(&self, booking_id: &str) -> DbResult<Option<Commission>> {
        let mut conn = self.pool.acquire().await?;
        find_for_booking(&mut conn, booking_id).await
    }

    /// Lists commissions, newest first.
    pub async fn list(&self, filter: &CommissionFilter) -> DbResult<Vec<Commission>> {
        let (limit, offset) = page(filter.limit, filter.offset);

        let commissions = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, booking_id, user_id, amount_cents, status, created_at, updated_at, paid_at
            FROM commissions
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(filter.user_id.as_deref())
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(commissions)
    }

    /// Marks a payable commission as paid out.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown ID
    /// - `Core(CommissionAlreadyPaid)` when it was paid before
    /// - `Core(CommissionNotPayable)` when the booking is not fully paid
    pub async fn mark_paid(&self, id: &str) -> DbResult<Commission> {
        let mut commission = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Commission", id))?;

        match commission.status {
            CommissionStatus::Payable => {}
            CommissionStatus::Paid => {
                return Err(CoreError::CommissionAlreadyPaid(commission.booking_id).into())
            }
            other => {
                return Err(CoreError::CommissionNotPayable {
                    commission_id: commission.id,
                    status: other.as_str().to_string(),
                }
                .into())
            }
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE commissions SET status = 'paid', paid_at = ?2, updated_at = ?2
            WHERE id = ?1 AND status = 'payable'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        // Lost a race with a status change
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Commission (payable)", id));
        }

        commission.status = CommissionStatus::Paid;
        commission.paid_at = Some(now);
        commission.updated_at = now;

        info!(
            commission_id = %commission.id,
            user_id = %commission.user_id,
            amount = commission.amount_cents,
            "Commission paid out"
        );
        Ok(commission)
    }

    /// Payable and paid totals per sales user.
    pub async fn summary(&self, user_id: Option<&str>) -> DbResult<Vec<CommissionSummary>> {
        let rows = sqlx::query_as::<_, CommissionSummary>(
            r#"
            SELECT
                user_id,
                SUM(CASE WHEN status = 'payable' THEN 1 ELSE 0 END) AS payable_count,
                SUM(CASE WHEN status = 'payable' THEN amount_cents ELSE 0 END) AS payable_cents,
                SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END) AS paid_count,
                SUM(CASE WHEN status = 'paid' THEN amount_cents ELSE 0 END) AS paid_cents
            FROM commissions
            WHERE ?1 IS NULL OR user_id = ?1
            GROUP BY user_id
            ORDER BY user_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// The commission of a booking, read inside a transaction.
pub(crate) async fn find_for_booking(
    conn: &mut SqliteConnection,
    booking_id: &str,
) -> DbResult<Option<Commission>> {
    let commission = sqlx::query_as::<_, Commission>(
        r#"
        SELECT id, booking_id, user_id, amount_cents, status, created_at, updated_at, paid_at
        FROM commissions
        WHERE booking_id = ?1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(commission)
}

/// Commission rate of the booking's sales user, if any.
async fn sales_rate(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<Option<SalesRate>> {
    let Some(user_id) = booking.sales_user_id.as_deref() else {
        return Ok(None);
    };

    let user = find_user(conn, user_id).await?;
    Ok(user.as_ref().and_then(SalesRate::from_user))
}

/// Brings the commission in line with a payment-status change.
///
/// `booking` carries the new status; `previous` is the status before the
/// change.
pub(crate) async fn apply_commission(
    conn: &mut SqliteConnection,
    booking: &Booking,
    previous: PaymentStatus,
) -> DbResult<()> {
    if previous == booking.payment_status {
        return Ok(());
    }

    let existing = find_for_booking(conn, &booking.id).await?;
    let rate = sales_rate(conn, booking).await?;

    let decision = decide_commission(
        previous,
        booking.payment_status,
        existing.as_ref().map(|c| c.status),
        rate.as_ref(),
    );

    write_decision(conn, booking, existing.as_ref(), decision).await
}

/// Moves the commission after the booking's sales user changed.
pub(crate) async fn apply_reassignment(
    conn: &mut SqliteConnection,
    booking: &Booking,
) -> DbResult<()> {
    let existing = find_for_booking(conn, &booking.id).await?;
    let rate = sales_rate(conn, booking).await?;

    let decision = decide_reassignment(booking.payment_status, existing.as_ref(), rate.as_ref())?;

    write_decision(conn, booking, existing.as_ref(), decision).await
}

async fn write_decision(
    conn: &mut SqliteConnection,
    booking: &Booking,
    existing: Option<&Commission>,
    decision: CommissionDecision,
) -> DbResult<()> {
    let now = Utc::now();

    match decision {
        CommissionDecision::Keep => {
            debug!(booking_id = %booking.id, "Commission unchanged");
        }

        CommissionDecision::Skip(reason) => {
            warn!(
                booking_id = %booking.id,
                sales_user_id = ?booking.sales_user_id,
                %reason,
                "Booking fully paid without commission"
            );
        }

        CommissionDecision::Create {
            user_id,
            amount,
            status,
        } => {
            let id = generate_id();
            sqlx::query(
                r#"
                INSERT INTO commissions (
                    id, booking_id, user_id, amount_cents, status,
                    created_at, updated_at, paid_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, NULL)
                "#,
            )
            .bind(&id)
            .bind(&booking.id)
            .bind(&user_id)
            .bind(amount.cents())
            .bind(status)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::from(e).with_value(&booking.id))?;

            info!(
                commission_id = %id,
                booking_id = %booking.id,
                user_id = %user_id,
                amount = amount.cents(),
                "Commission created"
            );
        }

        CommissionDecision::UpdateStatus(status) => {
            let Some(commission) = existing else {
                return Ok(());
            };
            sqlx::query("UPDATE commissions SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&commission.id)
                .bind(status)
                .bind(now)
                .execute(&mut *conn)
                .await?;

            info!(
                commission_id = %commission.id,
                booking_id = %booking.id,
                from = commission.status.as_str(),
                to = status.as_str(),
                "Commission status changed"
            );
        }

        CommissionDecision::Reassign {
            user_id,
            amount,
            status,
        } => {
            let Some(commission) = existing else {
                return Ok(());
            };
            sqlx::query(
                r#"
                UPDATE commissions SET
                    user_id = ?2, amount_cents = ?3, status = ?4, updated_at = ?5
                WHERE id = ?1
                "#,
            )
            .bind(&commission.id)
            .bind(&user_id)
            .bind(amount.cents())
            .bind(status)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            info!(
                commission_id = %commission.id,
                booking_id = %booking.id,
                from_user = %commission.user_id,
                to_user = %user_id,
                amount = amount.cents(),
                "Commission reassigned"
            );
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use tripdesk_core::{NewPayment, PaymentMethod, PaymentRatio};

    #[tokio::test]
    async fn test_mark_paid_and_summary() {
        let db = test_db().await;
        let trip = trip(&db, "IST-01").await;
        let deniz = customer(&db, "Deniz").await;
        let ayla = sales_user(&db, "Ayla").await;

        let mut request = booking_request(&trip, &deniz, PaymentRatio::Full, 1_020_000);
        request.sales_user_id = Some(ayla.id.clone());
        let booking = db.bookings().create_booking(request).await.unwrap().booking;

        let commission = db
            .commissions()
            .get_for_booking(&booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commission.status, CommissionStatus::Payable);

        let summary = db.commissions().summary(Some(&ayla.id)).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].payable_count, 1);
        assert_eq!(summary[0].payable_cents, 15_000);
        assert_eq!(summary[0].paid_count, 0);

        let paid = db.commissions().mark_paid(&commission.id).await.unwrap();
        assert_eq!(paid.status, CommissionStatus::Paid);
        assert!(paid.paid_at.is_some());

        let err = db.commissions().mark_paid(&commission.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CommissionAlreadyPaid(_))));

        let summary = db.commissions().summary(None).await.unwrap();
        assert_eq!(summary[0].paid_count, 1);
        assert_eq!(summary[0].paid_cents, 15_000);
        assert_eq!(summary[0].payable_cents, 0);
    }

    #[tokio::test]
    async fn test_pending_commission_cannot_be_paid() {
        let db = test_db().await;
        let trip = trip(&db, "IST-01").await;
        let deniz = customer(&db, "Deniz").await;
        let ayla = sales_user(&db, "Ayla").await;

        let mut request = booking_request(&trip, &deniz, PaymentRatio::Half, 510_000);
        request.sales_user_id = Some(ayla.id.clone());
        let booking = db.bookings().create_booking(request).await.unwrap().booking;

        db.bookings()
            .record_payment(
                &booking.id,
                NewPayment {
                    amount_cents: 510_000,
                    method: PaymentMethod::Card,
                    reference: None,
                    installment: None,
                },
            )
            .await
            .unwrap();
        db.bookings()
            .set_payment_status(&booking.id, PaymentStatus::Refunded)
            .await
            .unwrap();

        let commission = db
            .commissions()
            .get_for_booking(&booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commission.status, CommissionStatus::Cancelled);

        let err = db.commissions().mark_paid(&commission.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CommissionNotPayable { .. })));
    }

    #[tokio::test]
    async fn test_list_filters_by_user_and_status() {
        let db = test_db().await;
        let trip = trip(&db, "IST-01").await;
        let ayla = sales_user(&db, "Ayla").await;
        let berk = sales_user(&db, "Berk").await;

        for (name, seller) in [("Deniz", &ayla), ("Elif", &ayla), ("Mert", &berk)] {
            let c = customer(&db, name).await;
            let mut request = booking_request(&trip, &c, PaymentRatio::Full, 1_020_000);
            request.sales_user_id = Some(seller.id.clone());
            db.bookings().create_booking(request).await.unwrap();
        }

        let ayla_payable = db
            .commissions()
            .list(&CommissionFilter {
                user_id: Some(ayla.id.clone()),
                status: Some(CommissionStatus::Payable),
                ..CommissionFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ayla_payable.len(), 2);

        let paid = db
            .commissions()
            .list(&CommissionFilter {
                status: Some(CommissionStatus::Paid),
                ..CommissionFilter::default()
            })
            .await
            .unwrap();
        assert!(paid.is_empty());
    }
}
