//! # Trip Repository
//!
//! Database operations for the trip catalog.
//!
//! Bookings copy the trip's base price when they are created, so a price
//! change here never reprices existing bookings.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, like_pattern};
use tripdesk_core::input::{page, search_text};
use tripdesk_core::validation::validate_date_range;
use tripdesk_core::{CoreError, NewTrip, Trip, TripFilter, TripUpdate};

/// Repository for trip database operations.
#[derive(Debug, Clone)]
pub struct TripRepository {
    pool: SqlitePool,
}

impl TripRepository {
    /// Creates a new TripRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TripRepository { pool }
    }

    /// Inserts a new trip.
    ///
    /// ## Errors
    /// - `Core(Validation)` for a bad code, empty names, or return before departure
    /// - `UniqueViolation` when the code is taken
    pub async fn insert(&self, new: &NewTrip) -> DbResult<Trip> {
        new.validate()?;

        let now = Utc::now();
        let trip = Trip {
            id: generate_id(),
            code: new.code.trim().to_string(),
            name: new.name.trim().to_string(),
            destination: new.destination.trim().to_string(),
            departure_date: new.departure_date,
            return_date: new.return_date,
            base_price_cents: new.base_price_cents,
            capacity: new.capacity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO trips (
                id, code, name, destination, departure_date, return_date,
                base_price_cents, capacity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&trip.id)
        .bind(&trip.code)
        .bind(&trip.name)
        .bind(&trip.destination)
        .bind(trip.departure_date)
        .bind(trip.return_date)
        .bind(trip.base_price_cents)
        .bind(trip.capacity)
        .bind(trip.is_active)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&trip.code))?;

        info!(trip_id = %trip.id, code = %trip.code, base_price = trip.base_price_cents, "Trip created");
        Ok(trip)
    }

    /// Gets a trip by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Trip>> {
        let mut conn = self.pool.acquire().await?;
        find_trip(&mut conn, id).await
    }

    /// Gets a trip by its catalog code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            SELECT
                id, code, name, destination, departure_date, return_date,
                base_price_cents, capacity, is_active, created_at, updated_at
            FROM trips
            WHERE code = ?1
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(trip)
    }

    /// Lists trips by departure date.
    pub async fn list(&self, filter: &TripFilter) -> DbResult<Vec<Trip>> {
        let pattern = like_pattern(search_text(filter.q.as_deref())?);
        let (limit, offset) = page(filter.limit, filter.offset);

        debug!(search = ?pattern, active = ?filter.active, limit, offset, "Listing trips");

        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT
                id, code, name, destination, departure_date, return_date,
                base_price_cents, capacity, is_active, created_at, updated_at
            FROM trips
            WHERE (?1 IS NULL OR is_active = ?1)
              AND (?2 IS NULL OR code LIKE ?2 OR name LIKE ?2 OR destination LIKE ?2)
            ORDER BY departure_date, code
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(filter.active)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: &str, update: TripUpdate) -> DbResult<Trip> {
        update.validate()?;

        let mut trip = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Trip", id))?;

        if let Some(name) = update.name {
            trip.name = name.trim().to_string();
        }
        if let Some(destination) = update.destination {
            trip.destination = destination.trim().to_string();
        }
        if let Some(departure) = update.departure_date {
            trip.departure_date = departure;
        }
        if let Some(return_date) = update.return_date {
            trip.return_date = return_date;
        }
        if let Some(price) = update.base_price_cents {
            trip.base_price_cents = price;
        }
        if let Some(capacity) = update.capacity {
            trip.capacity = capacity;
        }
        if let Some(active) = update.is_active {
            trip.is_active = active;
        }
        validate_date_range(trip.departure_date, trip.return_date)?;
        trip.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE trips SET
                name = ?2,
                destination = ?3,
                departure_date = ?4,
                return_date = ?5,
                base_price_cents = ?6,
                capacity = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&trip.id)
        .bind(&trip.name)
        .bind(&trip.destination)
        .bind(trip.departure_date)
        .bind(trip.return_date)
        .bind(trip.base_price_cents)
        .bind(trip.capacity)
        .bind(trip.is_active)
        .bind(trip.updated_at)
        .execute(&self.pool)
        .await?;

        info!(trip_id = %trip.id, "Trip updated");
        Ok(trip)
    }

    /// Deletes a trip without bookings.
    ///
    /// Leads that asked about the trip keep their record with the interest
    /// cleared.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE trip_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if bookings > 0 {
            return Err(CoreError::StillReferenced {
                entity: "Trip".to_string(),
                id: id.to_string(),
                dependents: format!("{bookings} booking(s)"),
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Trip", id));
        }

        tx.commit().await?;

        info!(trip_id = %id, "Trip deleted");
        Ok(())
    }

    /// Number of open (not refunded or cancelled) bookings on a trip.
    pub async fn open_booking_count(&self, id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count_open_bookings(&mut conn, id).await
    }
}

/// Counts the seats held on a trip. Refunded and cancelled bookings free theirs.
pub(crate) async fn count_open_bookings(conn: &mut SqliteConnection, trip_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE trip_id = ?1 AND payment_status NOT IN ('refunded', 'cancelled')
        "#,
    )
    .bind(trip_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Loads a trip on an open connection or transaction.
pub(crate) async fn find_trip(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>(
        r#"
        SELECT
            id, code, name, destination, departure_date, return_date,
            base_price_cents, capacity, is_active, created_at, updated_at
        FROM trips
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(trip)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use chrono::NaiveDate;
    use tripdesk_core::PaymentRatio;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let created = trip(&db, "IST-01").await;

        let by_id = db.trips().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "IST-01");
        assert_eq!(by_id.departure_date, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert!(by_id.is_active);

        let by_code = db.trips().get_by_code("IST-01").await.unwrap().unwrap();
        assert_eq!(by_code.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let db = test_db().await;
        let first = trip(&db, "IST-01").await;

        let err = db
            .trips()
            .insert(&NewTrip {
                code: first.code.clone(),
                name: "Again".to_string(),
                destination: "Izmir".to_string(),
                departure_date: first.departure_date,
                return_date: first.return_date,
                base_price_cents: 100,
                capacity: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "IST-01"));
    }

    #[tokio::test]
    async fn test_list_filters_active_and_search() {
        let db = test_db().await;
        let ist = trip(&db, "IST-01").await;
        let cap = trip(&db, "CAP-01").await;

        db.trips()
            .update(
                &ist.id,
                TripUpdate {
                    is_active: Some(false),
                    ..TripUpdate::default()
                },
            )
            .await
            .unwrap();

        let active = db
            .trips()
            .list(&TripFilter {
                active: Some(true),
                ..TripFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "CAP-01");

        let searched = db
            .trips()
            .list(&TripFilter {
                q: Some("cap".to_string()),
                ..TripFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].id, cap.id);
    }

    #[tokio::test]
    async fn test_update_rejects_inverted_dates() {
        let db = test_db().await;
        let created = trip(&db, "IST-01").await;

        let err = db
            .trips()
            .update(
                &created.id,
                TripUpdate {
                    return_date: NaiveDate::from_ymd_opt(2026, 4, 1),
                    ..TripUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_refuses_booked_trip() {
        let db = test_db().await;
        let booked = trip(&db, "IST-01").await;
        let empty = trip(&db, "CAP-01").await;
        let deniz = customer(&db, "Deniz").await;

        db.bookings()
            .create_booking(booking_request(&booked, &deniz, PaymentRatio::Half, 510_000))
            .await
            .unwrap();
        assert_eq!(db.trips().open_booking_count(&booked.id).await.unwrap(), 1);

        let err = db.trips().delete(&booked.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::StillReferenced { .. })));

        db.trips().delete(&empty.id).await.unwrap();
        let err = db.trips().delete(&empty.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
