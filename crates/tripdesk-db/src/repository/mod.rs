//! # Repository Module
//!
//! Database repository implementations for TripDesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.bookings().record_payment(id, payment)                     │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── create_booking / update_booking / record_payment ...              │
//! │  │      │  one transaction per call                                    │
//! │  │      ├── companion::sync_companions(&mut tx, ...)                   │
//! │  │      └── commission::apply_commission(&mut tx, ...)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Rules live in tripdesk-core; repositories load state, ask the core   │
//! │  what to write, and write it.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer profiles
//! - [`TripRepository`](trip::TripRepository) - Trip catalog
//! - [`UserRepository`](user::UserRepository) - Staff and commission rates
//! - [`LeadRepository`](lead::LeadRepository) - Sales pipeline and conversion
//! - [`BookingRepository`](booking::BookingRepository) - Booking workflows
//! - [`CommissionRepository`](commission::CommissionRepository) - Commission payouts

pub mod booking;
pub mod commission;
pub mod companion;
pub mod customer;
pub mod lead;
pub mod trip;
pub mod user;

use uuid::Uuid;

/// Generates a new record ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trims optional free text; blank becomes `NULL`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `LIKE` pattern for a substring search.
pub(crate) fn like_pattern(search: Option<String>) -> Option<String> {
    search.map(|q| format!("%{q}%"))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use chrono::NaiveDate;
    use tripdesk_core::{
        BookingExtras, Customer, NewBooking, NewCustomer, NewPayment, NewTrip, NewUser,
        PaymentMethod, PaymentRatio, Trip, User, UserRole,
    };

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Trip priced at 10,000.00.
    pub async fn trip(db: &Database, code: &str) -> Trip {
        db.trips()
            .insert(&NewTrip {
                code: code.to_string(),
                name: format!("Trip {code}"),
                destination: "Istanbul".to_string(),
                departure_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                return_date: NaiveDate::from_ymd_opt(2026, 5, 8).unwrap(),
                base_price_cents: 1_000_000,
                capacity: 30,
            })
            .await
            .unwrap()
    }

    pub async fn customer(db: &Database, first: &str) -> Customer {
        db.customers()
            .insert(&NewCustomer {
                first_name: first.to_string(),
                last_name: "Yilmaz".to_string(),
                email: Some(format!("{}@example.com", first.to_lowercase())),
                ..NewCustomer::default()
            })
            .await
            .unwrap()
    }

    /// Sales user earning 150.00 per head.
    pub async fn sales_user(db: &Database, name: &str) -> User {
        db.users()
            .insert(&NewUser {
                name: name.to_string(),
                email: format!("{}@agency.example", name.to_lowercase()),
                role: UserRole::Sales,
                commission_per_head_cents: Some(15_000),
            })
            .await
            .unwrap()
    }

    /// Booking for `base 10,000 + bag 500 - discount 300 = 10,200`.
    pub fn booking_request(
        trip: &Trip,
        customer: &Customer,
        ratio: PaymentRatio,
        first_payment_cents: i64,
    ) -> NewBooking {
        NewBooking {
            trip_id: trip.id.clone(),
            customer_id: customer.id.clone(),
            sales_user_id: None,
            room_preference: None,
            seat_preference: None,
            extras: BookingExtras {
                bag_cents: 50_000,
                ..BookingExtras::default()
            },
            discount_cents: 30_000,
            payment_ratio: ratio,
            first_payment: NewPayment {
                amount_cents: first_payment_cents,
                method: PaymentMethod::BankTransfer,
                reference: None,
                installment: None,
            },
            companion_customer_ids: Vec::new(),
            notes: None,
        }
    }
}
