//! # Companion Links
//!
//! Loads a trip's bookings and companion rows, asks
//! [`tripdesk_core::companions`] for a plan, and applies it inside the
//! caller's transaction.
//!
//! ```text
//! sync_companions(&mut tx, booking, [b, c])
//!      │
//!      ├── load open bookings on the trip      (booking_id, customer_id)
//!      ├── load companion rows on the trip     (booking_id, companion_customer_id)
//!      ├── plan_companion_sync(...)            pure, may reject
//!      └── DELETE / INSERT booking_companions  same transaction
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use tripdesk_core::companions::{
    plan_companion_removal, plan_companion_sync, CompanionLink, CompanionPlan, TripBooking,
};
use tripdesk_core::Booking;

/// Open bookings on a trip.
pub(crate) async fn load_trip_bookings(
    conn: &mut SqliteConnection,
    trip_id: &str,
) -> DbResult<Vec<TripBooking>> {
    let bookings = sqlx::query_as::<_, TripBooking>(
        r#"
        SELECT id AS booking_id, customer_id
        FROM bookings
        WHERE trip_id = ?1 AND payment_status NOT IN ('refunded', 'cancelled')
        ORDER BY created_at
        "#,
    )
    .bind(trip_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(bookings)
}

/// Every companion row belonging to a booking on the trip.
pub(crate) async fn load_trip_links(
    conn: &mut SqliteConnection,
    trip_id: &str,
) -> DbResult<Vec<CompanionLink>> {
    let links = sqlx::query_as::<_, CompanionLink>(
        r#"
        SELECT bc.booking_id, bc.companion_customer_id
        FROM booking_companions bc
        INNER JOIN bookings b ON b.id = bc.booking_id
        WHERE b.trip_id = ?1
        ORDER BY bc.booking_id, bc.companion_customer_id
        "#,
    )
    .bind(trip_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(links)
}

/// Customer ids listed as companions of one booking.
pub(crate) async fn companion_customer_ids(
    conn: &mut SqliteConnection,
    booking_id: &str,
) -> DbResult<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT companion_customer_id
        FROM booking_companions
        WHERE booking_id = ?1
        ORDER BY companion_customer_id
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

async fn apply_plan(conn: &mut SqliteConnection, plan: &CompanionPlan) -> DbResult<()> {
    for link in &plan.delete {
        sqlx::query(
            "DELETE FROM booking_companions WHERE booking_id = ?1 AND companion_customer_id = ?2",
        )
        .bind(&link.booking_id)
        .bind(&link.companion_customer_id)
        .execute(&mut *conn)
        .await?;
    }

    for link in &plan.insert {
        sqlx::query(
            "INSERT INTO booking_companions (booking_id, companion_customer_id) VALUES (?1, ?2)",
        )
        .bind(&link.booking_id)
        .bind(&link.companion_customer_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Replaces a booking's companion list and keeps the relation symmetric.
///
/// ## Errors
/// - `Core(SelfCompanion)` / `Core(CompanionNotOnTrip)` from the planner
pub(crate) async fn sync_companions(
    conn: &mut SqliteConnection,
    booking: &Booking,
    customers: &[String],
) -> DbResult<()> {
    let subject = TripBooking {
        booking_id: booking.id.clone(),
        customer_id: booking.customer_id.clone(),
    };
    let trip_bookings = load_trip_bookings(conn, &booking.trip_id).await?;
    let existing = load_trip_links(conn, &booking.trip_id).await?;

    let plan = plan_companion_sync(&subject, customers, &trip_bookings, &existing)?;

    debug!(
        booking_id = %booking.id,
        inserted = plan.insert.len(),
        deleted = plan.delete.len(),
        "Syncing companions"
    );

    apply_plan(conn, &plan).await
}

/// Removes every link touching a booking, in both directions.
pub(crate) async fn remove_companions(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    let subject = TripBooking {
        booking_id: booking.id.clone(),
        customer_id: booking.customer_id.clone(),
    };
    let existing = load_trip_links(conn, &booking.trip_id).await?;
    let plan = plan_companion_removal(&subject, &existing);

    debug!(booking_id = %booking.id, deleted = plan.delete.len(), "Removing companions");

    apply_plan(conn, &plan).await
}
