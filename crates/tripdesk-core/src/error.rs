//! # Error Types
//!
//! Domain-specific error types for tripdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tripdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Booking rule violations                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tripdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  backoffice-api errors (app)                                           │
//! │  └── ApiError         - What the web UI sees (JSON + HTTP status)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → web UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::{Installment, PaymentStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Booking rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The discount is larger than base price plus extras.
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: Money, subtotal: Money },

    /// The first payment does not match `total × ratio`.
    ///
    /// ## User Workflow
    /// ```text
    /// New booking: total 10200.00, ratio 50%
    ///      │
    ///      ▼
    /// Agent enters first payment 5000.00
    ///      │
    ///      ▼
    /// FirstPaymentMismatch { expected: 5100.00, provided: 5000.00 }
    ///      │
    ///      ▼
    /// Form shows: "First payment must be 5100.00"
    /// ```
    #[error("First payment must be {expected}, got {provided}")]
    FirstPaymentMismatch { expected: Money, provided: Money },

    /// Recording this payment would exceed the booking total.
    #[error("Payment of {attempted} exceeds outstanding balance {outstanding}")]
    Overpayment { attempted: Money, outstanding: Money },

    /// The installment slot is already taken.
    #[error("{0:?} installment is already recorded")]
    InstallmentAlreadyRecorded(Installment),

    /// The previous installment has not been recorded yet.
    #[error("{installment:?} installment requires the {missing:?} installment first")]
    InstallmentOutOfOrder {
        installment: Installment,
        missing: Installment,
    },

    /// All three installment slots are taken.
    #[error("All {0} installments are already recorded")]
    NoInstallmentsLeft(usize),

    /// A manual status change the lifecycle does not allow.
    #[error("Cannot change payment status from {from:?} to {to:?}")]
    InvalidStatusTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// FULLY_PAID requires the payments to cover the total.
    #[error("Booking cannot be fully paid: paid {paid} of {total}")]
    StatusRequiresFullPayment { paid: Money, total: Money },

    /// Repricing would put the total below what was already collected.
    #[error("New total {total} is below the amount already paid {paid}")]
    TotalBelowPaid { total: Money, paid: Money },

    /// The booking is cancelled or refunded and can no longer change.
    #[error("Booking {booking_id} is {status:?}, cannot perform operation")]
    BookingClosed {
        booking_id: String,
        status: PaymentStatus,
    },

    /// A booking listed its own customer as companion.
    #[error("Customer {0} cannot be their own companion")]
    SelfCompanion(String),

    /// The companion has no open booking on the same trip.
    #[error("Customer {0} has no booking on this trip")]
    CompanionNotOnTrip(String),

    /// The trip is no longer open for bookings.
    #[error("Trip {0} is not accepting bookings")]
    TripInactive(String),

    /// Every seat on the trip is held by an open booking.
    #[error("Trip {trip_id} is full ({capacity} seats)")]
    TripFull { trip_id: String, capacity: i64 },

    /// A staff member is not a sales user and cannot own bookings.
    #[error("User {0} cannot be assigned as sales user")]
    NotASalesUser(String),

    /// The commission was already paid out and is frozen.
    #[error("Commission for booking {0} has already been paid")]
    CommissionAlreadyPaid(String),

    /// The commission is not in a state that can be paid out.
    #[error("Commission {commission_id} is {status}, only payable commissions can be paid")]
    CommissionNotPayable { commission_id: String, status: String },

    /// The lead was already turned into a customer.
    #[error("Lead {0} has already been converted")]
    LeadAlreadyConverted(String),

    /// The entity is still referenced and cannot be removed.
    #[error("{entity} {id} is still referenced by {dependents}")]
    StillReferenced {
        entity: String,
        id: String,
        dependents: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} is too large")]
    AmountTooLarge { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
