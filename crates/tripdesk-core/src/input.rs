//! # Write Models
//!
//! Payloads accepted by the create/update operations. The web UI posts these
//! as JSON; repositories validate them before touching the database.
//!
//! Update payloads use `Option` for "leave unchanged".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    CommissionStatus, Installment, LeadStatus, PaymentMethod, PaymentRatio, PaymentStatus,
    UserRole,
};
use crate::validation::{
    clamp_limit, validate_date_range, validate_email, validate_name, validate_non_negative,
    validate_optional_email, validate_search_query, validate_trip_code,
};

// =============================================================================
// Staff
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub commission_per_head_cents: Option<i64>,
}

impl NewUser {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("name", &self.name)?;
        validate_email("email", &self.email)?;
        if let Some(rate) = self.commission_per_head_cents {
            validate_non_negative("commission_per_head_cents", rate)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub commission_per_head_cents: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(email) = &self.email {
            validate_email("email", email)?;
        }
        if let Some(rate) = self.commission_per_head_cents {
            validate_non_negative("commission_per_head_cents", rate)?;
        }
        Ok(())
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_optional_email("email", self.email.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(first) = &self.first_name {
            validate_name("first_name", first)?;
        }
        if let Some(last) = &self.last_name {
            validate_name("last_name", last)?;
        }
        validate_optional_email("email", self.email.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Trip
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTrip {
    pub code: String,
    pub name: String,
    pub destination: String,
    #[ts(as = "String")]
    pub departure_date: NaiveDate,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
    pub base_price_cents: i64,
    pub capacity: i64,
}

impl NewTrip {
    pub fn validate(&self) -> CoreResult<()> {
        validate_trip_code(&self.code)?;
        validate_name("name", &self.name)?;
        validate_name("destination", &self.destination)?;
        validate_date_range(self.departure_date, self.return_date)?;
        validate_non_negative("base_price_cents", self.base_price_cents)?;
        validate_non_negative("capacity", self.capacity)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub departure_date: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub base_price_cents: Option<i64>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TripUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(destination) = &self.destination {
            validate_name("destination", destination)?;
        }
        if let Some(price) = self.base_price_cents {
            validate_non_negative("base_price_cents", price)?;
        }
        if let Some(capacity) = self.capacity {
            validate_non_negative("capacity", capacity)?;
        }
        Ok(())
    }
}

// =============================================================================
// Lead
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLead {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLead {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("full_name", &self.full_name)?;
        validate_optional_email("email", self.email.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LeadUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.full_name {
            validate_name("full_name", name)?;
        }
        validate_optional_email("email", self.email.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Booking
// =============================================================================

/// Optional add-ons priced per booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingExtras {
    /// Single-room supplement.
    #[serde(default)]
    pub single_cents: i64,
    /// Extra bed.
    #[serde(default)]
    pub bed_cents: i64,
    /// Seat selection.
    #[serde(default)]
    pub seat_cents: i64,
    /// Additional luggage.
    #[serde(default)]
    pub bag_cents: i64,
}

/// A payment as entered on the booking form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub amount_cents: i64,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
    /// Slot to record into; the next free slot when omitted.
    #[serde(default)]
    pub installment: Option<Installment>,
}

impl NewPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// The booking form submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBooking {
    pub trip_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub sales_user_id: Option<String>,
    #[serde(default)]
    pub room_preference: Option<String>,
    #[serde(default)]
    pub seat_preference: Option<String>,
    #[serde(default)]
    pub extras: BookingExtras,
    #[serde(default)]
    pub discount_cents: i64,
    pub payment_ratio: PaymentRatio,
    pub first_payment: NewPayment,
    /// Customers travelling together with this one on the same trip.
    #[serde(default)]
    pub companion_customer_ids: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBooking {
    /// Field checks only; pricing and ratio rules run against the trip.
    pub fn validate(&self) -> CoreResult<()> {
        if self.trip_id.trim().is_empty() {
            return Err(ValidationError::required("trip_id").into());
        }
        if self.customer_id.trim().is_empty() {
            return Err(ValidationError::required("customer_id").into());
        }
        // Zero only passes for a complimentary booking; checked against the total later
        validate_non_negative("first_payment", self.first_payment.amount_cents)?;
        Ok(())
    }
}

/// Partial booking edit.
///
/// `companion_customer_ids: Some(vec![])` clears the companion list;
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingUpdate {
    #[serde(default)]
    pub sales_user_id: Option<String>,
    #[serde(default)]
    pub room_preference: Option<String>,
    #[serde(default)]
    pub seat_preference: Option<String>,
    #[serde(default)]
    pub extras: Option<BookingExtras>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    #[serde(default)]
    pub companion_customer_ids: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BookingUpdate {
    /// Whether the edit changes anything that affects the price.
    pub fn reprices(&self) -> bool {
        self.extras.is_some() || self.discount_cents.is_some()
    }
}

/// Filter for booking lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingFilter {
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub sales_user_id: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

// =============================================================================
// List Filters
// =============================================================================

/// Search and paging for the plain list screens (customers, staff).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListParams {
    /// Free-text search over names, email and codes.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListParams {
    /// The trimmed search text, `None` when blank.
    pub fn search(&self) -> CoreResult<Option<String>> {
        search_text(self.q.as_deref())
    }

    pub fn page(&self) -> (i64, i64) {
        page(self.limit, self.offset)
    }
}

/// Filter for the trip catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripFilter {
    /// Only trips that accept bookings.
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Filter for the lead pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadFilter {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Filter for commission lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionFilter {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<CommissionStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Trimmed search text, `None` when absent or blank.
pub fn search_text(q: Option<&str>) -> CoreResult<Option<String>> {
    match q {
        Some(q) => {
            let q = validate_search_query(q)?;
            Ok(if q.is_empty() { None } else { Some(q) })
        }
        None => Ok(None),
    }
}

/// Clamped `(limit, offset)` for a list query.
pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (clamp_limit(limit), offset.unwrap_or(0).max(0))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trip_validation() {
        let trip = NewTrip {
            code: "CAPPADOCIA-26".to_string(),
            name: "Cappadocia Balloon Week".to_string(),
            destination: "Göreme".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2026, 5, 8).unwrap(),
            base_price_cents: 1_000_000,
            capacity: 40,
        };
        assert!(trip.validate().is_ok());

        let backwards = NewTrip {
            return_date: NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
            ..trip.clone()
        };
        assert!(backwards.validate().is_err());

        let negative = NewTrip {
            base_price_cents: -1,
            ..trip
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_new_customer_validation() {
        let customer = NewCustomer {
            first_name: "Deniz".to_string(),
            last_name: "Kaya".to_string(),
            email: Some("deniz@example.com".to_string()),
            ..NewCustomer::default()
        };
        assert!(customer.validate().is_ok());

        let bad_email = NewCustomer {
            email: Some("not-an-email".to_string()),
            ..customer
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_booking_payload_defaults() {
        let json = r#"{
            "trip_id": "t-1",
            "customer_id": "c-1",
            "payment_ratio": "half",
            "first_payment": { "amount_cents": 510000 }
        }"#;
        let booking: NewBooking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.extras, BookingExtras::default());
        assert_eq!(booking.discount_cents, 0);
        assert_eq!(booking.first_payment.method, PaymentMethod::BankTransfer);
        assert!(booking.companion_customer_ids.is_empty());
    }

    #[test]
    fn test_new_booking_requires_ids_and_payment() {
        let json = r#"{
            "trip_id": " ",
            "customer_id": "c-1",
            "payment_ratio": "full",
            "first_payment": { "amount_cents": 100 }
        }"#;
        let booking: NewBooking = serde_json::from_str(json).unwrap();
        assert!(booking.validate().is_err());

        let booking = NewBooking {
            trip_id: "t-1".to_string(),
            first_payment: NewPayment {
                amount_cents: -1,
                ..booking.first_payment.clone()
            },
            ..booking
        };
        assert!(booking.validate().is_err());

        let complimentary = NewBooking {
            first_payment: NewPayment {
                amount_cents: 0,
                ..booking.first_payment.clone()
            },
            ..booking
        };
        assert!(complimentary.validate().is_ok());
    }

    #[test]
    fn test_search_and_paging() {
        assert_eq!(search_text(None).unwrap(), None);
        assert_eq!(search_text(Some("   ")).unwrap(), None);
        assert_eq!(search_text(Some(" kaya ")).unwrap(), Some("kaya".to_string()));
        assert!(search_text(Some(&"x".repeat(101))).is_err());

        assert_eq!(page(None, None), (crate::DEFAULT_LIST_LIMIT, 0));
        assert_eq!(page(Some(10), Some(-5)), (10, 0));
    }
}
