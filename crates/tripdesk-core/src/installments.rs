//! # Installments
//!
//! The first-payment ratio policy and the three-slot installment plan.
//!
//! ## Payment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Booking Payment Lifecycle                           │
//! │                                                                         │
//! │  Create booking                                                        │
//! │     └── First installment = total × ratio {100%, 50%, 30%}             │
//! │         (±0.01 tolerance, otherwise rejected)                          │
//! │                                                                         │
//! │  Later                                                                 │
//! │     └── Second installment (free-form amount)                          │
//! │     └── Third installment  (free-form amount)                          │
//! │                                                                         │
//! │  Derived status after every change                                     │
//! │     paid == 0          → pending                                       │
//! │     0 < paid < total   → partially_paid                                │
//! │     paid == total      → fully_paid                                    │
//! │                                                                         │
//! │  Manual                                                                │
//! │     any open status    → refunded | cancelled                          │
//! │     refunded           → cancelled                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The running sum of installments never exceeds the total, so a booking is
//! fully paid exactly when its payments add up to its total.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BookingPayment, Installment, PaymentRatio, PaymentStatus};
use crate::validation::validate_payment_amount;
use crate::{FIRST_PAYMENT_TOLERANCE_CENTS, MAX_INSTALLMENTS};

// =============================================================================
// Ratio Policy
// =============================================================================

impl PaymentRatio {
    /// Share of the total due with the first installment, in percent.
    pub const fn percent(&self) -> u32 {
        match self {
            PaymentRatio::Full => 100,
            PaymentRatio::Half => 50,
            PaymentRatio::Thirty => 30,
        }
    }

    /// Expected first installment for a total.
    ///
    /// ```rust
    /// use tripdesk_core::{Money, PaymentRatio};
    ///
    /// let total = Money::from_major(10_200);
    /// assert_eq!(PaymentRatio::Half.first_payment(total), Money::from_major(5_100));
    /// assert_eq!(PaymentRatio::Thirty.first_payment(total), Money::from_major(3_060));
    /// ```
    pub fn first_payment(&self, total: Money) -> Money {
        total.percent(self.percent())
    }
}

/// Checks a submitted first payment against the ratio policy.
///
/// Accepts the amount when it is within 0.01 of `total × ratio` and returns
/// the submitted amount unchanged; anything further off is rejected.
///
/// A zero total is a complimentary booking: the only acceptable first
/// payment is zero. Any other booking needs a positive first payment.
pub fn validate_first_payment(
    total: Money,
    ratio: PaymentRatio,
    provided: Money,
) -> CoreResult<Money> {
    if total.is_zero() {
        if !provided.is_zero() {
            return Err(CoreError::Overpayment {
                attempted: provided,
                outstanding: total,
            });
        }
        return Ok(provided);
    }
    validate_payment_amount(provided.cents())?;

    let expected = ratio.first_payment(total);

    if provided.abs_diff(expected).cents() > FIRST_PAYMENT_TOLERANCE_CENTS {
        return Err(CoreError::FirstPaymentMismatch { expected, provided });
    }

    Ok(provided)
}

// =============================================================================
// Installment Slots
// =============================================================================

impl Installment {
    pub const ALL: [Installment; MAX_INSTALLMENTS] =
        [Installment::First, Installment::Second, Installment::Third];

    /// The slot that must be filled before this one.
    pub const fn previous(&self) -> Option<Installment> {
        match self {
            Installment::First => None,
            Installment::Second => Some(Installment::First),
            Installment::Third => Some(Installment::Second),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

impl PaymentStatus {
    /// Refunded and cancelled bookings no longer take payments or edits.
    pub const fn is_closed(&self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`, ignoring
    /// what the payments say.
    ///
    /// `cancelled` is terminal and `refunded` may only become `cancelled`.
    /// Open statuses may move anywhere.
    pub const fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match (*self, next) {
            (PaymentStatus::Cancelled, PaymentStatus::Cancelled) => true,
            (PaymentStatus::Cancelled, _) => false,
            (PaymentStatus::Refunded, PaymentStatus::Refunded | PaymentStatus::Cancelled) => true,
            (PaymentStatus::Refunded, _) => false,
            _ => true,
        }
    }
}

// =============================================================================
// Installment Plan
// =============================================================================

/// The installments recorded against one booking total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentPlan {
    total: Money,
    recorded: BTreeMap<Installment, Money>,
}

impl InstallmentPlan {
    /// An empty plan for a total.
    pub fn new(total: Money) -> Self {
        InstallmentPlan {
            total,
            recorded: BTreeMap::new(),
        }
    }

    /// Rebuilds a plan from stored payment rows.
    ///
    /// Stored rows were validated when written and are taken as-is.
    pub fn from_payments(total: Money, payments: &[BookingPayment]) -> Self {
        let recorded = payments
            .iter()
            .map(|p| (p.installment, p.amount()))
            .collect();
        InstallmentPlan { total, recorded }
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn paid(&self) -> Money {
        self.recorded.values().sum()
    }

    pub fn outstanding(&self) -> Money {
        self.total - self.paid()
    }

    pub fn amount_for(&self, installment: Installment) -> Option<Money> {
        self.recorded.get(&installment).copied()
    }

    /// The first free slot, in order.
    pub fn next_installment(&self) -> Option<Installment> {
        Installment::ALL
            .into_iter()
            .find(|slot| !self.recorded.contains_key(slot))
    }

    /// Records a payment into a slot (the next free one when `None`).
    ///
    /// ## Rules
    /// - amount must be positive
    /// - each slot is used once; slots fill in order
    /// - the running sum never exceeds the total
    pub fn record(&mut self, slot: Option<Installment>, amount: Money) -> CoreResult<Installment> {
        validate_payment_amount(amount.cents())?;

        let slot = match slot {
            Some(slot) => slot,
            None => self
                .next_installment()
                .ok_or(CoreError::NoInstallmentsLeft(MAX_INSTALLMENTS))?,
        };

        if self.recorded.contains_key(&slot) {
            return Err(CoreError::InstallmentAlreadyRecorded(slot));
        }

        if let Some(previous) = slot.previous() {
            if !self.recorded.contains_key(&previous) {
                return Err(CoreError::InstallmentOutOfOrder {
                    installment: slot,
                    missing: previous,
                });
            }
        }

        let outstanding = self.outstanding();
        if amount > outstanding {
            return Err(CoreError::Overpayment {
                attempted: amount,
                outstanding,
            });
        }

        self.recorded.insert(slot, amount);
        Ok(slot)
    }

    /// Changes the total after a booking is repriced.
    pub fn reprice(&mut self, total: Money) -> CoreResult<()> {
        let paid = self.paid();
        if total < paid {
            return Err(CoreError::TotalBelowPaid { total, paid });
        }
        self.total = total;
        Ok(())
    }

    /// Status implied by the recorded payments alone.
    ///
    /// Nothing is owed on a zero total, so it reads as fully paid.
    pub fn derived_status(&self) -> PaymentStatus {
        let paid = self.paid();
        if paid >= self.total {
            PaymentStatus::FullyPaid
        } else if paid.is_zero() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::PartiallyPaid
        }
    }

    /// Checks a manual status change requested by staff.
    ///
    /// ## Rules
    /// - `cancelled` is terminal; `refunded` may only move to `cancelled`
    /// - any open status may move to `refunded` or `cancelled`
    /// - `pending`, `partially_paid` and `fully_paid` are only accepted when
    ///   they match what the payments imply
    pub fn check_transition(&self, current: PaymentStatus, next: PaymentStatus) -> CoreResult<()> {
        if current == next {
            return Ok(());
        }

        if !current.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                from: current,
                to: next,
            });
        }

        match next {
            PaymentStatus::Refunded | PaymentStatus::Cancelled => Ok(()),
            PaymentStatus::FullyPaid if self.derived_status() != PaymentStatus::FullyPaid => {
                Err(CoreError::StatusRequiresFullPayment {
                    paid: self.paid(),
                    total: self.total,
                })
            }
            _ if next == self.derived_status() => Ok(()),
            _ => Err(CoreError::InvalidStatusTransition {
                from: current,
                to: next,
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
