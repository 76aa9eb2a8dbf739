//! # Pricing
//!
//! Booking total from the trip's base price, optional extras and a discount.
//!
//! ```text
//! total = base + single_extra + bed_extra + seat_extra + bag_extra − discount
//! ```
//!
//! Every input is a non-negative amount; the discount may not exceed the
//! subtotal, so a total is never negative.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::input::BookingExtras;
use crate::money::Money;
use crate::validation::validate_non_negative;

/// The pricing inputs of a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceInputs {
    pub base: Money,
    pub single_extra: Money,
    pub bed_extra: Money,
    pub seat_extra: Money,
    pub bag_extra: Money,
    pub discount: Money,
}

/// A calculated price, echoed back to the booking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub base: Money,
    pub single_extra: Money,
    pub bed_extra: Money,
    pub seat_extra: Money,
    pub bag_extra: Money,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl PriceInputs {
    /// Builds inputs from a base price, the form's extras and a discount.
    pub fn new(base: Money, extras: BookingExtras, discount: Money) -> Self {
        PriceInputs {
            base,
            single_extra: Money::from_cents(extras.single_cents),
            bed_extra: Money::from_cents(extras.bed_cents),
            seat_extra: Money::from_cents(extras.seat_cents),
            bag_extra: Money::from_cents(extras.bag_cents),
            discount,
        }
    }

    /// Returns a copy with the extras replaced.
    pub fn with_extras(self, extras: BookingExtras) -> Self {
        PriceInputs::new(self.base, extras, self.discount)
    }

    /// Returns a copy with the discount replaced.
    pub fn with_discount(self, discount: Money) -> Self {
        PriceInputs { discount, ..self }
    }

    /// Extras as the form represents them.
    pub fn extras(&self) -> BookingExtras {
        BookingExtras {
            single_cents: self.single_extra.cents(),
            bed_cents: self.bed_extra.cents(),
            seat_cents: self.seat_extra.cents(),
            bag_cents: self.bag_extra.cents(),
        }
    }

    /// Calculates the booking total.
    ///
    /// ## Errors
    /// - `Validation(MustNotBeNegative)` naming the first negative input
    /// - `Validation(AmountTooLarge)` when the subtotal does not fit in cents
    /// - `DiscountExceedsSubtotal` when the discount is larger than base + extras
    ///
    /// ## Example
    /// ```rust
    /// use tripdesk_core::money::Money;
    /// use tripdesk_core::pricing::PriceInputs;
    ///
    /// let price = PriceInputs {
    ///     base: Money::from_major(10_000),
    ///     bag_extra: Money::from_major(500),
    ///     discount: Money::from_major(300),
    ///     ..PriceInputs::default()
    /// }
    /// .calculate()
    /// .unwrap();
    /// assert_eq!(price.total, Money::from_major(10_200));
    /// ```
    pub fn calculate(&self) -> CoreResult<PriceBreakdown> {
        validate_non_negative("base_price", self.base.cents())?;
        validate_non_negative("single_extra", self.single_extra.cents())?;
        validate_non_negative("bed_extra", self.bed_extra.cents())?;
        validate_non_negative("seat_extra", self.seat_extra.cents())?;
        validate_non_negative("bag_extra", self.bag_extra.cents())?;
        validate_non_negative("discount", self.discount.cents())?;

        let mut subtotal = self.base;
        for (field, extra) in [
            ("single_extra", self.single_extra),
            ("bed_extra", self.bed_extra),
            ("seat_extra", self.seat_extra),
            ("bag_extra", self.bag_extra),
        ] {
            subtotal = subtotal
                .checked_add(extra)
                .ok_or_else(|| ValidationError::AmountTooLarge {
                    field: field.to_string(),
                })?;
        }

        let total = subtotal
            .checked_sub_non_negative(self.discount)
            .ok_or(CoreError::DiscountExceedsSubtotal {
                discount: self.discount,
                subtotal,
            })?;

        Ok(PriceBreakdown {
            base: self.base,
            single_extra: self.single_extra,
            bed_extra: self.bed_extra,
            seat_extra: self.seat_extra,
            bag_extra: self.bag_extra,
            subtotal,
            discount: self.discount,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_example() {
        let price = PriceInputs {
            base: Money::from_major(10_000),
            bag_extra: Money::from_major(500),
            discount: Money::from_major(300),
            ..PriceInputs::default()
        }
        .calculate()
        .unwrap();

        assert_eq!(price.subtotal, Money::from_major(10_500));
        assert_eq!(price.total, Money::from_major(10_200));
    }

    #[test]
    fn test_all_extras_are_added() {
        let inputs = PriceInputs::new(
            Money::from_major(1_000),
            BookingExtras {
                single_cents: 25_000,
                bed_cents: 5_000,
                seat_cents: 1_500,
                bag_cents: 4_000,
            },
            Money::from_cents(500),
        );
        let price = inputs.calculate().unwrap();
        assert_eq!(price.subtotal.cents(), 100_000 + 25_000 + 5_000 + 1_500 + 4_000);
        assert_eq!(price.total.cents(), price.subtotal.cents() - 500);
        assert_eq!(inputs.extras().single_cents, 25_000);
    }

    #[test]
    fn test_discount_equal_to_subtotal_gives_zero() {
        let price = PriceInputs {
            base: Money::from_major(100),
            discount: Money::from_major(100),
            ..PriceInputs::default()
        }
        .calculate()
        .unwrap();
        assert!(price.total.is_zero());
    }

    #[test]
    fn test_discount_exceeding_subtotal_is_rejected() {
        let err = PriceInputs {
            base: Money::from_major(100),
            discount: Money::from_cents(10_001),
            ..PriceInputs::default()
        }
        .calculate()
        .unwrap_err();
        assert!(matches!(err, CoreError::DiscountExceedsSubtotal { .. }));
    }

    #[test]
    fn test_negative_extra_is_rejected() {
        let err = PriceInputs {
            base: Money::from_major(100),
            seat_extra: Money::from_cents(-1),
            ..PriceInputs::default()
        }
        .calculate()
        .unwrap_err();
        match err {
            CoreError::Validation(ValidationError::MustNotBeNegative { field }) => {
                assert_eq!(field, "seat_extra")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_helpers_replace_fields() {
        let inputs = PriceInputs {
            base: Money::from_major(100),
            ..PriceInputs::default()
        };
        let repriced = inputs
            .with_extras(BookingExtras {
                bag_cents: 1_000,
                ..BookingExtras::default()
            })
            .with_discount(Money::from_cents(500));
        assert_eq!(repriced.calculate().unwrap().total.cents(), 10_500);
    }

    #[test]
    fn test_oversized_extras_are_rejected() {
        let err = PriceInputs {
            base: Money::from_cents(1),
            bag_extra: Money::from_cents(i64::MAX),
            ..PriceInputs::default()
        }
        .calculate()
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::AmountTooLarge { ref field }) if field == "bag_extra"
        ));
    }
}
