//! # Booking Repository
//!
//! The booking workflows. Each public operation runs in one transaction:
//! pricing, installments, companion links and the commission either all
//! change together or not at all.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_booking (one transaction)                     │
//! │                                                                         │
//! │  1. Load trip ──────────── must exist and be active                    │
//! │  2. Check customer + sales user                                        │
//! │  3. PriceInputs::calculate() ── base snapshot + extras - discount      │
//! │  4. validate_first_payment() ── total × ratio, ±0.01                   │
//! │  5. INSERT booking + first installment                                 │
//! │  6. sync_companions() ───────── symmetric rows on the trip             │
//! │  7. apply_commission() ──────── payable commission if fully paid       │
//! │  8. COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status
//! The payment status is derived from the recorded installments after every
//! write. Staff can only set it by hand to `refunded` or `cancelled`, or to
//! the status the payments already imply.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::commission::{apply_commission, apply_reassignment, find_for_booking};
use crate::repository::companion::{companion_customer_ids, remove_companions, sync_companions};
use crate::repository::customer::ensure_customer_exists;
use crate::repository::trip::{count_open_bookings, find_trip};
use crate::repository::user::find_user;
use crate::repository::{generate_id, non_blank};
use tripdesk_core::input::page;
use tripdesk_core::installments::{validate_first_payment, InstallmentPlan};
use tripdesk_core::pricing::{PriceBreakdown, PriceInputs};
use tripdesk_core::{
    Booking, BookingDetail, BookingFilter, BookingPayment, BookingUpdate, CommissionStatus,
    CoreError, Installment, Money, NewBooking, NewPayment, PaymentStatus, UserRole,
};

/// Repository for booking workflows.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // =========================================================================
    // Workflows
    // =========================================================================

    /// Creates a booking with its first installment.
    ///
    /// A complimentary booking (total of zero) stores no payment row and
    /// starts out fully paid.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown trip, customer or sales user
    /// - `Core(TripInactive)` / `Core(NotASalesUser)`
    /// - `Core(TripFull)` once open bookings fill the trip's capacity
    /// - `Core(DiscountExceedsSubtotal)` / `Core(FirstPaymentMismatch)`
    /// - `Core(SelfCompanion)` / `Core(CompanionNotOnTrip)`
    /// - `UniqueViolation` when the customer already has an open booking on
    ///   the trip
    pub async fn create_booking(&self, new: NewBooking) -> DbResult<BookingDetail> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;

        let trip = find_trip(&mut tx, new.trip_id.trim())
            .await?
            .ok_or_else(|| DbError::not_found("Trip", &new.trip_id))?;
        if !trip.is_active {
            return Err(CoreError::TripInactive(trip.id).into());
        }
        if count_open_bookings(&mut tx, &trip.id).await? >= trip.capacity {
            return Err(CoreError::TripFull {
                trip_id: trip.id,
                capacity: trip.capacity,
            }
            .into());
        }

        let customer_id = new.customer_id.trim().to_string();
        ensure_customer_exists(&mut tx, &customer_id).await?;

        let sales_user_id = non_blank(new.sales_user_id.clone());
        if let Some(user_id) = sales_user_id.as_deref() {
            ensure_sales_user(&mut tx, user_id).await?;
        }

        let price = PriceInputs::new(
            trip.base_price(),
            new.extras,
            Money::from_cents(new.discount_cents),
        )
        .calculate()?;
        let first =
            validate_first_payment(price.total, new.payment_ratio, new.first_payment.amount())?;

        let mut plan = InstallmentPlan::new(price.total);
        let slot = if first.is_zero() {
            None
        } else {
            Some(plan.record(Some(Installment::First), first)?)
        };

        let now = Utc::now();
        let mut booking = Booking {
            id: generate_id(),
            trip_id: trip.id.clone(),
            customer_id,
            sales_user_id,
            room_preference: non_blank(new.room_preference.clone()),
            seat_preference: non_blank(new.seat_preference.clone()),
            base_price_cents: 0,
            single_extra_cents: 0,
            bed_extra_cents: 0,
            seat_extra_cents: 0,
            bag_extra_cents: 0,
            discount_cents: 0,
            total_cents: 0,
            payment_ratio: new.payment_ratio,
            payment_status: plan.derived_status(),
            notes: non_blank(new.notes.clone()),
            created_at: now,
            updated_at: now,
        };
        apply_price(&mut booking, &price);

        insert_booking(&mut tx, &booking).await?;
        if let Some(slot) = slot {
            insert_payment(&mut tx, &booking.id, slot, &new.first_payment).await?;
        }

        sync_companions(&mut tx, &booking, &new.companion_customer_ids).await?;
        apply_commission(&mut tx, &booking, PaymentStatus::Pending).await?;

        let detail = load_detail(&mut tx, booking).await?;
        tx.commit().await?;

        info!(
            booking_id = %detail.booking.id,
            trip_id = %detail.booking.trip_id,
            total = detail.booking.total_cents,
            first_payment = first.cents(),
            status = ?detail.booking.payment_status,
            "Booking created"
        );
        Ok(detail)
    }

    /// Applies a partial edit.
    ///
    /// Refunded and cancelled bookings only accept notes and preferences.
    ///
    /// ## Errors
    /// - `Core(BookingClosed)` for pricing, companion or sales edits on a
    ///   closed booking
    /// - `Core(TotalBelowPaid)` when repricing under the amount collected
    /// - `Core(CommissionAlreadyPaid)` when moving a paid-out commission
    pub async fn update_booking(&self, id: &str, update: BookingUpdate) -> DbResult<BookingDetail> {
        let mut tx = self.pool.begin().await?;

        let mut booking = find_booking(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;
        let previous = booking.payment_status;
        let closed = previous.is_closed();

        if closed
            && (update.reprices()
                || update.companion_customer_ids.is_some()
                || update.sales_user_id.is_some())
        {
            return Err(CoreError::BookingClosed {
                booking_id: booking.id,
                status: previous,
            }
            .into());
        }

        if update.room_preference.is_some() {
            booking.room_preference = non_blank(update.room_preference);
        }
        if update.seat_preference.is_some() {
            booking.seat_preference = non_blank(update.seat_preference);
        }
        if update.notes.is_some() {
            booking.notes = non_blank(update.notes);
        }

        let payments = load_payments(&mut tx, &booking.id).await?;
        let mut plan = InstallmentPlan::from_payments(booking.total(), &payments);

        if update.extras.is_some() || update.discount_cents.is_some() {
            let mut inputs = booking.price_inputs();
            if let Some(extras) = update.extras {
                inputs = inputs.with_extras(extras);
            }
            if let Some(discount) = update.discount_cents {
                inputs = inputs.with_discount(Money::from_cents(discount));
            }
            let price = inputs.calculate()?;
            plan.reprice(price.total)?;

            debug!(
                booking_id = %booking.id,
                old_total = booking.total_cents,
                new_total = price.total.cents(),
                "Repricing booking"
            );
            apply_price(&mut booking, &price);
        }

        let mut sales_changed = false;
        if let Some(requested) = update.sales_user_id {
            let next = non_blank(Some(requested));
            if next != booking.sales_user_id {
                if let Some(user_id) = next.as_deref() {
                    ensure_sales_user(&mut tx, user_id).await?;
                }
                booking.sales_user_id = next;
                sales_changed = true;
            }
        }

        if !closed {
            booking.payment_status = plan.derived_status();
        }
        booking.updated_at = Utc::now();
        write_booking(&mut tx, &booking).await?;

        if let Some(companions) = &update.companion_customer_ids {
            sync_companions(&mut tx, &booking, companions).await?;
        }
        if sales_changed {
            apply_reassignment(&mut tx, &booking).await?;
        }
        apply_commission(&mut tx, &booking, previous).await?;

        let detail = load_detail(&mut tx, booking).await?;
        tx.commit().await?;

        info!(
            booking_id = %detail.booking.id,
            total = detail.booking.total_cents,
            status = ?detail.booking.payment_status,
            "Booking updated"
        );
        Ok(detail)
    }

    /// Records a further installment.
    ///
    /// ## Errors
    /// - `Core(BookingClosed)` on a refunded or cancelled booking
    /// - `Core(InstallmentAlreadyRecorded)` / `Core(InstallmentOutOfOrder)`
    /// - `Core(NoInstallmentsLeft)` after the third installment
    /// - `Core(Overpayment)` past the booking total
    pub async fn record_payment(
        &self,
        booking_id: &str,
        payment: NewPayment,
    ) -> DbResult<BookingDetail> {
        let mut tx = self.pool.begin().await?;

        let mut booking = find_booking(&mut tx, booking_id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", booking_id))?;
        ensure_open(&booking)?;

        let payments = load_payments(&mut tx, &booking.id).await?;
        let mut plan = InstallmentPlan::from_payments(booking.total(), &payments);
        let slot = plan.record(payment.installment, payment.amount())?;

        insert_payment(&mut tx, &booking.id, slot, &payment).await?;

        let previous = booking.payment_status;
        let next = plan.derived_status();
        if next != previous {
            set_status(&mut tx, &mut booking, next).await?;
            apply_commission(&mut tx, &booking, previous).await?;
        }

        let detail = load_detail(&mut tx, booking).await?;
        tx.commit().await?;

        info!(
            booking_id = %detail.booking.id,
            installment = ?slot,
            amount = payment.amount_cents,
            outstanding = detail.outstanding_cents,
            status = ?detail.booking.payment_status,
            "Payment recorded"
        );
        Ok(detail)
    }

    /// Sets the payment status by hand.
    ///
    /// Refunding or cancelling drops the booking's companion links in both
    /// directions.
    ///
    /// ## Errors
    /// - `Core(InvalidStatusTransition)` for a move the lifecycle forbids
    /// - `Core(StatusRequiresFullPayment)` for `fully_paid` without full payment
    pub async fn set_payment_status(
        &self,
        booking_id: &str,
        status: PaymentStatus,
    ) -> DbResult<BookingDetail> {
        let mut tx = self.pool.begin().await?;

        let mut booking = find_booking(&mut tx, booking_id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", booking_id))?;
        let previous = booking.payment_status;

        let payments = load_payments(&mut tx, &booking.id).await?;
        let plan = InstallmentPlan::from_payments(booking.total(), &payments);
        plan.check_transition(previous, status)?;

        if status != previous {
            set_status(&mut tx, &mut booking, status).await?;
            if status.is_closed() {
                remove_companions(&mut tx, &booking).await?;
            }
            apply_commission(&mut tx, &booking, previous).await?;

            info!(
                booking_id = %booking.id,
                from = ?previous,
                to = ?status,
                "Payment status changed"
            );
        }

        let detail = load_detail(&mut tx, booking).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Deletes a booking with its payments, links and commission.
    ///
    /// ## Errors
    /// - `Core(CommissionAlreadyPaid)` once the commission was paid out
    pub async fn delete_booking(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let booking = find_booking(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;

        if let Some(commission) = find_for_booking(&mut tx, &booking.id).await? {
            if commission.status == CommissionStatus::Paid {
                return Err(CoreError::CommissionAlreadyPaid(booking.id).into());
            }
        }

        remove_companions(&mut tx, &booking).await?;

        // Payments, own companion rows and the commission cascade
        sqlx::query("DELETE FROM bookings WHERE id = ?1")
            .bind(&booking.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(booking_id = %booking.id, trip_id = %booking.trip_id, "Booking deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a booking by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await?;
        find_booking(&mut conn, id).await
    }

    /// Booking with payments, companions and commission.
    pub async fn get_booking_detail(&self, id: &str) -> DbResult<Option<BookingDetail>> {
        let mut conn = self.pool.acquire().await?;

        match find_booking(&mut conn, id).await? {
            Some(booking) => Ok(Some(load_detail(&mut conn, booking).await?)),
            None => Ok(None),
        }
    }

    /// Recorded installments of a booking, in slot order.
    pub async fn payments(&self, booking_id: &str) -> DbResult<Vec<BookingPayment>> {
        let mut conn = self.pool.acquire().await?;
        load_payments(&mut conn, booking_id).await
    }

    /// Lists bookings, newest first.
    pub async fn list_bookings(&self, filter: &BookingFilter) -> DbResult<Vec<Booking>> {
        let (limit, offset) = page(filter.limit, filter.offset);

        debug!(
            trip_id = ?filter.trip_id,
            customer_id = ?filter.customer_id,
            status = ?filter.payment_status,
            limit,
            offset,
            "Listing bookings"
        );

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, trip_id, customer_id, sales_user_id, room_preference, seat_preference,
                base_price_cents, single_extra_cents, bed_extra_cents, seat_extra_cents,
                bag_extra_cents, discount_cents, total_cents, payment_ratio, payment_status,
                notes, created_at, updated_at
            FROM bookings
            WHERE (?1 IS NULL OR trip_id = ?1)
              AND (?2 IS NULL OR customer_id = ?2)
              AND (?3 IS NULL OR sales_user_id = ?3)
              AND (?4 IS NULL OR payment_status = ?4)
            ORDER BY created_at DESC
            LIMIT ?5 OFFSET ?6
            "#,
        )
        .bind(filter.trip_id.as_deref())
        .bind(filter.customer_id.as_deref())
        .bind(filter.sales_user_id.as_deref())
        .bind(filter.payment_status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

fn ensure_open(booking: &Booking) -> DbResult<()> {
    if booking.payment_status.is_closed() {
        return Err(CoreError::BookingClosed {
            booking_id: booking.id.clone(),
            status: booking.payment_status,
        }
        .into());
    }
    Ok(())
}

fn apply_price(booking: &mut Booking, price: &PriceBreakdown) {
    booking.base_price_cents = price.base.cents();
    booking.single_extra_cents = price.single_extra.cents();
    booking.bed_extra_cents = price.bed_extra.cents();
    booking.seat_extra_cents = price.seat_extra.cents();
    booking.bag_extra_cents = price.bag_extra.cents();
    booking.discount_cents = price.discount.cents();
    booking.total_cents = price.total.cents();
}

/// Fails unless the user exists and is an active sales user.
async fn ensure_sales_user(conn: &mut SqliteConnection, user_id: &str) -> DbResult<()> {
    let user = find_user(conn, user_id)
        .await?
        .ok_or_else(|| DbError::not_found("User", user_id))?;

    if user.role != UserRole::Sales || !user.is_active {
        return Err(CoreError::NotASalesUser(user.id).into());
    }
    Ok(())
}

pub(crate) async fn find_booking(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            id, trip_id, customer_id, sales_user_id, room_preference, seat_preference,
            base_price_cents, single_extra_cents, bed_extra_cents, seat_extra_cents,
            bag_extra_cents, discount_cents, total_cents, payment_ratio, payment_status,
            notes, created_at, updated_at
        FROM bookings
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(booking)
}

async fn load_payments(
    conn: &mut SqliteConnection,
    booking_id: &str,
) -> DbResult<Vec<BookingPayment>> {
    let mut payments = sqlx::query_as::<_, BookingPayment>(
        r#"
        SELECT id, booking_id, installment, amount_cents, method, reference, paid_at
        FROM booking_payments
        WHERE booking_id = ?1
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    // Slots are stored as text, so order them here
    payments.sort_by_key(|p| p.installment);
    Ok(payments)
}

async fn load_detail(conn: &mut SqliteConnection, booking: Booking) -> DbResult<BookingDetail> {
    let payments = load_payments(conn, &booking.id).await?;
    let companion_customer_ids = companion_customer_ids(conn, &booking.id).await?;
    let commission = find_for_booking(conn, &booking.id).await?;

    let plan = InstallmentPlan::from_payments(booking.total(), &payments);

    Ok(BookingDetail {
        paid_cents: plan.paid().cents(),
        outstanding_cents: plan.outstanding().cents(),
        booking,
        payments,
        companion_customer_ids,
        commission,
    })
}

async fn insert_booking(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, trip_id, customer_id, sales_user_id, room_preference, seat_preference,
            base_price_cents, single_extra_cents, bed_extra_cents, seat_extra_cents,
            bag_extra_cents, discount_cents, total_cents, payment_ratio, payment_status,
            notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.trip_id)
    .bind(&booking.customer_id)
    .bind(&booking.sales_user_id)
    .bind(&booking.room_preference)
    .bind(&booking.seat_preference)
    .bind(booking.base_price_cents)
    .bind(booking.single_extra_cents)
    .bind(booking.bed_extra_cents)
    .bind(booking.seat_extra_cents)
    .bind(booking.bag_extra_cents)
    .bind(booking.discount_cents)
    .bind(booking.total_cents)
    .bind(booking.payment_ratio)
    .bind(booking.payment_status)
    .bind(&booking.notes)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_value(&booking.customer_id))?;

    Ok(())
}

async fn write_booking(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE bookings SET
            sales_user_id = ?2,
            room_preference = ?3,
            seat_preference = ?4,
            single_extra_cents = ?5,
            bed_extra_cents = ?6,
            seat_extra_cents = ?7,
            bag_extra_cents = ?8,
            discount_cents = ?9,
            total_cents = ?10,
            payment_status = ?11,
            notes = ?12,
            updated_at = ?13
        WHERE id = ?1
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.sales_user_id)
    .bind(&booking.room_preference)
    .bind(&booking.seat_preference)
    .bind(booking.single_extra_cents)
    .bind(booking.bed_extra_cents)
    .bind(booking.seat_extra_cents)
    .bind(booking.bag_extra_cents)
    .bind(booking.discount_cents)
    .bind(booking.total_cents)
    .bind(booking.payment_status)
    .bind(&booking.notes)
    .bind(booking.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn set_status(
    conn: &mut SqliteConnection,
    booking: &mut Booking,
    status: PaymentStatus,
) -> DbResult<()> {
    booking.payment_status = status;
    booking.updated_at = Utc::now();

    sqlx::query("UPDATE bookings SET payment_status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(&booking.id)
        .bind(booking.payment_status)
        .bind(booking.updated_at)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn insert_payment(
    conn: &mut SqliteConnection,
    booking_id: &str,
    installment: Installment,
    payment: &NewPayment,
) -> DbResult<BookingPayment> {
    let row = BookingPayment {
        id: generate_id(),
        booking_id: booking_id.to_string(),
        installment,
        amount_cents: payment.amount_cents,
        method: payment.method,
        reference: non_blank(payment.reference.clone()),
        paid_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO booking_payments (
            id, booking_id, installment, amount_cents, method, reference, paid_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&row.id)
    .bind(&row.booking_id)
    .bind(row.installment)
    .bind(row.amount_cents)
    .bind(row.method)
    .bind(&row.reference)
    .bind(row.paid_at)
    .execute(&mut *conn)
    .await?;

    debug!(booking_id = %booking_id, installment = ?installment, amount = row.amount_cents, "Payment row inserted");
    Ok(row)
}

// =============================================================================
// Tests
// =============================================================================
