//! # Money Module
//!
//! Provides the `Money` type used for every price, extra, discount,
//! installment and commission in TripDesk.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A 30% deposit on a 10,200.10 trip in floating point:                   │
//! │    10200.10 * 0.3 = 3060.0299999999997                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1020010 cents * 30 / 100 = 306003 cents (rounded half-up)           │
//! │    Comparison against the submitted deposit is exact                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tripdesk_core::money::Money;
//!
//! let base = Money::from_major(10_000);
//! let bag = Money::from_cents(50_000);
//! assert_eq!((base + bag).cents(), 1_050_000);
//! assert_eq!(base.percent(30).cents(), 300_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// Trip.base_price ──► PriceInputs ──► PriceBreakdown.total ──┬──► first payment (ratio)
///                                                             │
/// extras, discount ───────┘                                   └──► InstallmentPlan
///
/// User.commission_per_head ──► Commission.amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ```rust
    /// use tripdesk_core::money::Money;
    /// assert_eq!(Money::from_major(5_100).cents(), 510_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute difference between two amounts.
    #[inline]
    pub const fn abs_diff(&self, other: Money) -> Money {
        Money((self.0 - other.0).abs())
    }

    /// Takes a whole percentage of the amount, rounding half away from zero.
    ///
    /// ## Implementation
    /// `(cents * pct + 50) / 100` in i128 so large totals cannot overflow.
    ///
    /// ```rust
    /// use tripdesk_core::money::Money;
    ///
    /// // 30% of 100.05 = 30.015 -> 30.02
    /// assert_eq!(Money::from_cents(10_005).percent(30).cents(), 3_002);
    /// // 50% of 0.01 = 0.005 -> 0.01
    /// assert_eq!(Money::from_cents(1).percent(50).cents(), 1);
    /// ```
    pub fn percent(&self, pct: u32) -> Money {
        let scaled = self.0 as i128 * pct as i128;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded as i64)
    }

    /// Addition that reports overflow instead of wrapping.
    ///
    /// ```rust
    /// use tripdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1).checked_add(Money::from_cents(2)), Some(Money::from_cents(3)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    /// ```
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtraction that refuses to go below zero.
    #[inline]
    pub const fn checked_sub_non_negative(&self, other: Money) -> Option<Money> {
        if other.0 > self.0 {
            None
        } else {
            Some(Money(self.0 - other.0))
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as a plain decimal amount, e.g. `10200.00`.
///
/// Currency symbols and grouping are the web UI's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a head count.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, heads: i64) -> Self {
        Money(self.0 * heads)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let money = Money::from_cents(510_025);
        assert_eq!(money.major(), 5_100);
        assert_eq!(money.minor(), 25);
        assert_eq!(Money::from_major(12).cents(), 1_200);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_major(10_200).to_string(), "10200.00");
        assert_eq!(Money::from_cents(505).to_string(), "5.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_checked_add_detects_overflow() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::zero()), Some(max));
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_percent_ratios() {
        let total = Money::from_major(10_200);
        assert_eq!(total.percent(100), total);
        assert_eq!(total.percent(50), Money::from_major(5_100));
        assert_eq!(total.percent(30), Money::from_major(3_060));
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 30% of 0.05 = 0.015 -> 0.02
        assert_eq!(Money::from_cents(5).percent(30).cents(), 2);
        // 30% of 0.04 = 0.012 -> 0.01
        assert_eq!(Money::from_cents(4).percent(30).cents(), 1);
        assert_eq!(Money::from_cents(-5).percent(30).cents(), -2);
    }

    #[test]
    fn test_sum_and_diff() {
        let payments = [Money::from_major(100), Money::from_major(50), Money::from_cents(1)];
        let total: Money = payments.iter().sum();
        assert_eq!(total.cents(), 15_001);
        assert_eq!(Money::from_cents(100).abs_diff(Money::from_cents(99)).cents(), 1);
        assert_eq!(Money::from_cents(99).abs_diff(Money::from_cents(100)).cents(), 1);
    }

    #[test]
    fn test_checked_sub_non_negative() {
        let subtotal = Money::from_major(100);
        assert_eq!(
            subtotal.checked_sub_non_negative(Money::from_major(30)),
            Some(Money::from_major(70))
        );
        assert_eq!(subtotal.checked_sub_non_negative(Money::from_major(101)), None);
    }

    #[test]
    fn test_head_count_multiplication() {
        assert_eq!((Money::from_major(150) * 3).cents(), 45_000);
    }
}
