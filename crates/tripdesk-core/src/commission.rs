//! # Commission
//!
//! Decides what happens to a booking's commission record when its payment
//! status changes or its sales user is reassigned.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Commission on status change                          │
//! │                                                                         │
//! │  previous == next                     → Keep                           │
//! │  existing commission is PAID          → Keep (frozen)                  │
//! │                                                                         │
//! │  No commission yet                                                     │
//! │  ├── next == fully_paid, sales rate   → Create { rate × 1, payable }   │
//! │  ├── next == fully_paid, no rate      → Skip(reason)                   │
//! │  └── anything else                    → Keep                           │
//! │                                                                         │
//! │  Existing commission                                                   │
//! │  ├── fully_paid                       → payable                        │
//! │  ├── pending / partially_paid         → pending                        │
//! │  └── refunded / cancelled             → cancelled                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store enforces one commission per booking, so `Create` is only ever
//! decided when no record exists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Commission, CommissionStatus, PaymentStatus, User};

/// Travellers covered by one booking.
pub const HEADS_PER_BOOKING: i64 = 1;

/// The commission rate of the sales user assigned to a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRate {
    pub user_id: String,
    pub per_head: Money,
}

impl SalesRate {
    /// The rate of a user, if the user is an active sales user with a
    /// positive per-head rate.
    pub fn from_user(user: &User) -> Option<SalesRate> {
        user.commission_rate().map(|per_head| SalesRate {
            user_id: user.id.clone(),
            per_head,
        })
    }

    /// Commission earned for one booking.
    pub fn amount_for_booking(&self) -> Money {
        self.per_head * HEADS_PER_BOOKING
    }
}

/// Why no commission was created for a fully paid booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The booking has no sales user, or the user earns no commission.
    NoSalesRate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoSalesRate => write!(f, "no active sales user with a per-head rate"),
        }
    }
}

/// The write to perform on the commission table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommissionDecision {
    /// Insert a new commission record.
    Create {
        user_id: String,
        amount: Money,
        status: CommissionStatus,
    },
    /// Change the status of the existing record.
    UpdateStatus(CommissionStatus),
    /// Move the existing record to another sales user.
    Reassign {
        user_id: String,
        amount: Money,
        status: CommissionStatus,
    },
    /// Leave the table untouched.
    Keep,
    /// A commission was due but cannot be created.
    Skip(SkipReason),
}

impl CommissionStatus {
    /// The commission status that follows a booking payment status.
    pub const fn for_payment_status(status: PaymentStatus) -> CommissionStatus {
        match status {
            PaymentStatus::FullyPaid => CommissionStatus::Payable,
            PaymentStatus::Pending | PaymentStatus::PartiallyPaid => CommissionStatus::Pending,
            PaymentStatus::Refunded | PaymentStatus::Cancelled => CommissionStatus::Cancelled,
        }
    }
}

/// Decides the commission write for a payment-status transition.
///
/// ## Arguments
/// * `previous` - booking status before the change
/// * `next` - booking status after the change
/// * `existing` - status of the booking's commission record, if any
/// * `sales` - rate of the assigned sales user, if any
///
/// ## Example
/// ```rust
/// use tripdesk_core::commission::{decide_commission, CommissionDecision, SalesRate};
/// use tripdesk_core::{CommissionStatus, Money, PaymentStatus};
///
/// let rate = SalesRate { user_id: "u-1".into(), per_head: Money::from_major(150) };
/// let decision = decide_commission(
///     PaymentStatus::PartiallyPaid,
///     PaymentStatus::FullyPaid,
///     None,
///     Some(&rate),
/// );
/// assert_eq!(
///     decision,
///     CommissionDecision::Create {
///         user_id: "u-1".into(),
///         amount: Money::from_major(150),
///         status: CommissionStatus::Payable,
///     }
/// );
/// ```
pub fn decide_commission(
    previous: PaymentStatus,
    next: PaymentStatus,
    existing: Option<CommissionStatus>,
    sales: Option<&SalesRate>,
) -> CommissionDecision {
    if previous == next {
        return CommissionDecision::Keep;
    }

    match existing {
        Some(CommissionStatus::Paid) => CommissionDecision::Keep,
        Some(current) => {
            let target = CommissionStatus::for_payment_status(next);
            if target == current {
                CommissionDecision::Keep
            } else {
                CommissionDecision::UpdateStatus(target)
            }
        }
        None if next == PaymentStatus::FullyPaid => match sales {
            Some(rate) => CommissionDecision::Create {
                user_id: rate.user_id.clone(),
                amount: rate.amount_for_booking(),
                status: CommissionStatus::Payable,
            },
            None => CommissionDecision::Skip(SkipReason::NoSalesRate),
        },
        None => CommissionDecision::Keep,
    }
}

/// Decides the commission write when a booking's sales user changes.
///
/// An unpaid commission follows the booking to the new user at the new
/// user's rate; without a rate it is cancelled. A fully paid booking that
/// had no commission gets one now.
///
/// ## Errors
/// - `CommissionAlreadyPaid` when the commission was paid to another user
pub fn decide_reassignment(
    status: PaymentStatus,
    existing: Option<&Commission>,
    sales: Option<&SalesRate>,
) -> CoreResult<CommissionDecision> {
    let Some(commission) = existing else {
        return Ok(decide_commission(PaymentStatus::Pending, status, None, sales));
    };

    if commission.status == CommissionStatus::Paid {
        return match sales {
            Some(rate) if rate.user_id == commission.user_id => Ok(CommissionDecision::Keep),
            _ => Err(CoreError::CommissionAlreadyPaid(commission.booking_id.clone())),
        };
    }

    let decision = match sales {
        Some(rate) => {
            let amount = rate.amount_for_booking();
            let target = CommissionStatus::for_payment_status(status);
            if rate.user_id == commission.user_id
                && amount == commission.amount()
                && target == commission.status
            {
                CommissionDecision::Keep
            } else {
                CommissionDecision::Reassign {
                    user_id: rate.user_id.clone(),
                    amount,
                    status: target,
                }
            }
        }
        None if commission.status == CommissionStatus::Cancelled => CommissionDecision::Keep,
        None => CommissionDecision::UpdateStatus(CommissionStatus::Cancelled),
    };

    Ok(decision)
}

// =============================================================================
// Unit Tests
// =============================================================================
