//! # Money
//!
//! Integer cents. Every figure the engine reports (prices, totals, costs,
//! profit, commission) is a `Money`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  exact                              rounded once, half to even          │
//! │  ─────────────────────────────      ──────────────────────────────      │
//! │  Σ line totals = subtotal           quantity × unit price               │
//! │  total − cost  = profit             buy price × markup                  │
//! │  Σ per staff   = leaderboard        profit × percentage                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tally_core::money::Money;
//!
//! let glass = Money::from_cents(350);
//! let round = glass.scale(Decimal::new(15, 1));
//! assert_eq!(round.cents(), 525);
//! assert_eq!((round + Money::from_cents(75)).to_string(), "$6.00");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// An amount in cents. Signed: profit and commission go negative.
///
/// Serializes as a bare integer. `+` and `-` saturate at the `i64` bounds;
/// input paths use [`Money::checked_add`] and [`Money::checked_scale`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// From cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// From whole dollars.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Money(dollars * 100)
    }

    /// The amount in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole dollars, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Cents past the whole dollar, 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Returns the value as an exact decimal number of cents.
    #[inline]
    pub fn as_decimal_cents(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Multiplies money by an exact decimal factor, rounding to the cent.
    ///
    /// Covers `quantity × unit price`, `buy price × markup` and
    /// `profit × percentage`. Rounds half to even.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    ///
    /// let per_pound = Money::from_cents(250); // $2.50
    /// // 0.5 lb → $1.25
    /// assert_eq!(per_pound.scale(Decimal::new(5, 1)).cents(), 125);
    /// // 0.25 lb → $0.625 → $0.62 (half to even)
    /// assert_eq!(per_pound.scale(Decimal::new(25, 2)).cents(), 62);
    /// ```
    pub fn scale(&self, factor: Decimal) -> Money {
        self.checked_scale(factor).unwrap_or_else(|| {
            if self.is_negative() != factor.is_sign_negative() && !self.is_zero() {
                Money(i64::MIN)
            } else {
                Money(i64::MAX)
            }
        })
    }

    /// Like [`Money::scale`], but `None` when the product leaves the `i64`
    /// cent range.
    pub fn checked_scale(&self, factor: Decimal) -> Option<Money> {
        let exact = self.as_decimal_cents().checked_mul(factor)?;
        Money::checked_from_decimal_cents(exact)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Converts a decimal number of cents to Money, rounding half to even.
    ///
    /// Saturates at the `i64` bounds instead of panicking.
    pub fn from_decimal_cents(cents: Decimal) -> Money {
        let rounded = cents.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        let value = rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Money(value)
    }

    /// Like [`Money::from_decimal_cents`], but `None` outside the `i64` range.
    pub fn checked_from_decimal_cents(cents: Decimal) -> Option<Money> {
        cents
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i64()
            .map(Money)
    }

    /// Returns `self` if non-negative, otherwise zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$12.50`, `-$3.05`. For logs; the dashboard does its own formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", self.dollars().abs(), self.cents_part())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
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
    fn test_parts() {
        let whiskey = Money::from_cents(5035);
        assert_eq!(whiskey.dollars(), 50);
        assert_eq!(whiskey.cents_part(), 35);
        assert_eq!(Money::from_dollars(-5).cents(), -500);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(350).to_string(), "$3.50");
        assert_eq!(Money::from_cents(-4000).to_string(), "-$40.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_profit_arithmetic() {
        let total = Money::from_dollars(60);
        let cost = Money::from_dollars(100);
        let profit = total - cost;
        assert!(profit.is_negative());
        assert_eq!(profit.clamp_non_negative(), Money::zero());

        let mut running = Money::zero();
        running += profit;
        running += Money::from_dollars(45);
        assert_eq!(running, Money::from_dollars(5));
    }

    #[test]
    fn test_sum() {
        let commissions = [Money::from_cents(500), Money::from_cents(1600), Money::from_cents(-300)];
        let by_ref: Money = commissions.iter().sum();
        let by_value: Money = commissions.into_iter().sum();
        assert_eq!(by_ref.cents(), 1800);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_scale_rounds_half_to_even() {
        // 0.25 lb of $2.50 jerky: 62.5 cents
        assert_eq!(Money::from_cents(250).scale(Decimal::new(25, 2)).cents(), 62);
        // 187.5 cents
        assert_eq!(Money::from_cents(375).scale(Decimal::new(5, 1)).cents(), 188);
        assert_eq!(Money::from_cents(-125).scale(Decimal::new(5, 1)).cents(), -62);
        assert_eq!(Money::from_cents(299).scale(Decimal::from(3)).cents(), 897);
    }

    #[test]
    fn test_from_decimal_cents_saturates() {
        let huge = Decimal::from(i64::MAX) * Decimal::from(4);
        assert_eq!(Money::from_decimal_cents(huge).cents(), i64::MAX);
        assert_eq!(Money::from_decimal_cents(-huge).cents(), i64::MIN);
    }

    #[test]
    fn test_scale_overflow() {
        let price = Money::from_cents(10_000_000_000);
        let qty = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        assert_eq!(price.checked_scale(qty), None);
        assert_eq!(price.scale(qty).cents(), i64::MAX);
        assert_eq!(price.scale(-qty).cents(), i64::MIN);
        assert_eq!(
            price.checked_scale(Decimal::from(3)),
            Some(Money::from_cents(30_000_000_000))
        );
    }

    #[test]
    fn test_addition_saturates() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!((max + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - Money::from_cents(1)).cents(), i64::MIN);

        let mut running = max;
        running += Money::from_cents(500);
        assert_eq!(running, max);
        assert_eq!([max, max].iter().sum::<Money>(), max);
    }

    #[test]
    fn test_serializes_as_integer_cents() {
        assert_eq!(serde_json::to_string(&Money::from_cents(2000)).unwrap(), "2000");
        let back: Money = serde_json::from_str("-4000").unwrap();
        assert_eq!(back.cents(), -4000);
    }
}
