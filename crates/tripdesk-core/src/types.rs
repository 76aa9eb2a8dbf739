//! # Domain Types
//!
//! Records stored by TripDesk, one per database table.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐      ┌──────────────────┐      ┌─────────────────┐   │
//! │  │     Trip     │◄─────│     Booking      │─────►│    Customer     │   │
//! │  │  code        │ 1  n │  price snapshot  │ n  1 │  name, passport │   │
//! │  │  base_price  │      │  payment_ratio   │      └─────────────────┘   │
//! │  └──────────────┘      │  payment_status  │               ▲            │
//! │                        └───┬─────┬────┬───┘               │            │
//! │                 1..3       │     │    │ companions (n..n) │            │
//! │        ┌───────────────────┘     │    └───────────────────┘            │
//! │        ▼                         ▼ 0..1                                │
//! │  ┌──────────────┐      ┌──────────────────┐      ┌─────────────────┐   │
//! │  │BookingPayment│      │    Commission    │─────►│   User (staff)  │   │
//! │  │ installment  │      │  amount, status  │      │ per-head rate   │   │
//! │  └──────────────┘      └──────────────────┘      └─────────────────┘   │
//! │                                                                         │
//! │  Lead ──(convert)──► Customer                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary columns are `*_cents: i64`; accessors return [`Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::PriceInputs;

// =============================================================================
// Staff
// =============================================================================

/// Role of a back-office staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    /// Owns bookings and earns commission.
    Sales,
    Operations,
}

/// A staff member.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Flat commission per booked traveller; `None` for non-sales staff.
    pub commission_per_head_cents: Option<i64>,
    /// Deactivated users keep their history but get no new commissions.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Per-head commission rate, if this user earns commission at all.
    pub fn commission_rate(&self) -> Option<Money> {
        if self.role != UserRole::Sales || !self.is_active {
            return None;
        }
        self.commission_per_head_cents
            .map(Money::from_cents)
            .filter(Money::is_positive)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A traveller known to the agency.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub passport_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Trip
// =============================================================================

/// A trip in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Trip {
    pub id: String,
    /// Human-facing catalog code, e.g. `ISTANBUL-2026-05`.
    pub code: String,
    pub name: String,
    pub destination: String,
    #[ts(as = "String")]
    pub departure_date: NaiveDate,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
    /// Price per traveller before extras and discount.
    pub base_price_cents: i64,
    pub capacity: i64,
    /// Inactive trips accept no new bookings.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Lead
// =============================================================================

/// Stage of a lead in the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

/// A prospective customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Lead {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Where the lead came from (walk-in, website, referral, ...).
    pub source: Option<String>,
    pub status: LeadStatus,
    /// Trip the lead asked about.
    pub trip_id: Option<String>,
    pub assigned_user_id: Option<String>,
    /// Set once the lead is converted.
    pub customer_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Splits `full_name` into (first, last) for customer conversion.
    ///
    /// The first word is the first name; everything after it is the last
    /// name. A single word leaves the last name empty.
    pub fn split_name(&self) -> (String, String) {
        let trimmed = self.full_name.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
            None => (trimmed.to_string(), String::new()),
        }
    }
}

// =============================================================================
// Booking Enums
// =============================================================================

/// Share of the total collected as the first payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRatio {
    /// 100% up front.
    Full,
    /// 50% deposit.
    Half,
    /// 30% deposit.
    Thirty,
}

/// Payment state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    FullyPaid,
    Refunded,
    Cancelled,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Installment slot of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Installment {
    First,
    Second,
    Third,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::BankTransfer
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A customer's reservation on a trip.
///
/// The trip's base price is copied at booking time so later catalog price
/// changes do not reprice existing bookings.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub trip_id: String,
    pub customer_id: String,
    pub sales_user_id: Option<String>,
    pub room_preference: Option<String>,
    pub seat_preference: Option<String>,
    pub base_price_cents: i64,
    pub single_extra_cents: i64,
    pub bed_extra_cents: i64,
    pub seat_extra_cents: i64,
    pub bag_extra_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_ratio: PaymentRatio,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// The pricing inputs currently stored on the booking.
    pub fn price_inputs(&self) -> PriceInputs {
        PriceInputs {
            base: Money::from_cents(self.base_price_cents),
            single_extra: Money::from_cents(self.single_extra_cents),
            bed_extra: Money::from_cents(self.bed_extra_cents),
            seat_extra: Money::from_cents(self.seat_extra_cents),
            bag_extra: Money::from_cents(self.bag_extra_cents),
            discount: Money::from_cents(self.discount_cents),
        }
    }
}

/// One installment paid against a booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookingPayment {
    pub id: String,
    pub booking_id: String,
    pub installment: Installment,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// Bank reference, receipt number, card authorization, ...
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

impl BookingPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Commission
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Booking not (or no longer) fully paid.
    Pending,
    /// Booking fully paid; waiting for payout.
    Payable,
    /// Paid out to the sales user. Frozen.
    Paid,
    /// Booking refunded or cancelled.
    Cancelled,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Payable => "payable",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Cancelled => "cancelled",
        }
    }
}

/// Commission credited to a sales user for one booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Commission {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub status: CommissionStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Commission {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Everything the booking screen shows in one payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingDetail {
    pub booking: Booking,
    pub payments: Vec<BookingPayment>,
    pub companion_customer_ids: Vec<String>,
    pub commission: Option<Commission>,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
}

/// Commission totals for one sales user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CommissionSummary {
    pub user_id: String,
    pub payable_count: i64,
    pub payable_cents: i64,
    pub paid_count: i64,
    pub paid_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_user(rate: Option<i64>) -> User {
        User {
            id: "u-1".to_string(),
            name: "Selin".to_string(),
            email: "selin@example.com".to_string(),
            role: UserRole::Sales,
            commission_per_head_cents: rate,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_commission_rate_only_for_active_sales() {
        let user = sales_user(Some(15_000));
        assert_eq!(user.commission_rate(), Some(Money::from_major(150)));

        let mut inactive = sales_user(Some(15_000));
        inactive.is_active = false;
        assert_eq!(inactive.commission_rate(), None);

        let mut ops = sales_user(Some(15_000));
        ops.role = UserRole::Operations;
        assert_eq!(ops.commission_rate(), None);

        assert_eq!(sales_user(Some(0)).commission_rate(), None);
        assert_eq!(sales_user(None).commission_rate(), None);
    }

    #[test]
    fn test_lead_split_name() {
        let mut lead = Lead {
            id: "l-1".to_string(),
            full_name: "  Ayşe Nur Demir ".to_string(),
            email: None,
            phone: None,
            source: None,
            status: LeadStatus::New,
            trip_id: None,
            assigned_user_id: None,
            customer_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            lead.split_name(),
            ("Ayşe".to_string(), "Nur Demir".to_string())
        );

        lead.full_name = "Cher".to_string();
        assert_eq!(lead.split_name(), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::FullyPaid).unwrap(),
            "\"fully_paid\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
        let ratio: PaymentRatio = serde_json::from_str("\"thirty\"").unwrap();
        assert_eq!(ratio, PaymentRatio::Thirty);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(LeadStatus::default(), LeadStatus::New);
    }
}
