//! # Domain Types
//!
//! Small value types and enumerations shared by every engine component.
//!
//! `Quantity` is an exact decimal (0.5 oz, 3 pcs). `Percentage` is 0-100.
//! `Markup` multiplies a cost (2.0 doubles it) and `Margin` is profit over
//! subtotal, in percent.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;

// =============================================================================
// Quantity
// =============================================================================

/// A quantity of a sale line or recipe ingredient.
///
/// Exact decimal, because ingredients are measured in fractions
/// (0.5 oz of syrup, 0.25 lb of jerky).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    Decimal,
);

impl Quantity {
    /// Creates a quantity from an exact decimal.
    #[inline]
    pub const fn new(value: Decimal) -> Self {
        Quantity(value)
    }

    /// Creates a whole-unit quantity.
    #[inline]
    pub fn units(count: i64) -> Self {
        Quantity(Decimal::from(count))
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Checks if the quantity is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in the closed range 0–100 (15 means 15%).
///
/// Used by commission rules. Unlike the tax rates of a till, commission
/// percentages come from rule configuration, so the range is enforced at
/// construction. There is no `Deserialize`: percentages enter through
/// validated rule parameters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
pub struct Percentage(
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    Decimal,
);

impl Percentage {
    /// Creates a percentage, rejecting values outside 0–100.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::types::Percentage;
    ///
    /// assert!(Percentage::new("percentage", Decimal::from(15)).is_ok());
    /// assert!(Percentage::new("percentage", Decimal::from(101)).is_err());
    /// ```
    pub fn new(field: &str, value: Decimal) -> ValidationResult<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: "0".to_string(),
                max: "100".to_string(),
            });
        }
        Ok(Percentage(value))
    }

    /// Creates a whole-number percentage, saturating at 100.
    pub fn whole(value: u8) -> Self {
        Percentage(Decimal::from(value.min(100)))
    }

    /// Returns the percentage value (15 for 15%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Applies this percentage to an amount: `amount × pct / 100`.
    ///
    /// Negative amounts stay negative; the sign is never clamped.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Percentage;
    ///
    /// let profit = Money::from_dollars(80);
    /// assert_eq!(Percentage::whole(20).of(profit), Money::from_dollars(16));
    /// ```
    pub fn of(&self, amount: Money) -> Money {
        Money::from_decimal_cents(amount.as_decimal_cents() * self.0 / Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Markup
// =============================================================================

/// A price multiplier applied to a cost (2.0 doubles the buy price).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Markup(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Markup {
    /// Creates a markup multiplier.
    #[inline]
    pub const fn new(multiplier: Decimal) -> Self {
        Markup(multiplier)
    }

    /// Returns the multiplier.
    #[inline]
    pub const fn multiplier(&self) -> Decimal {
        self.0
    }

    /// Applies the markup to a cost.
    #[inline]
    pub fn apply(&self, cost: Money) -> Money {
        cost.scale(self.0)
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "×{}", self.0.normalize())
    }
}

// =============================================================================
// Margin
// =============================================================================

/// Profit as a percentage of subtotal.
///
/// ## The Zero-Subtotal Convention
/// ```text
/// subtotal > 0   →  margin = profit / subtotal × 100
/// subtotal == 0  →  margin = 0   (undefined, reported as 0 — never NaN)
/// ```
///
/// Kept as an exact decimal so that two margins always compare with a total
/// order (leaderboards rank on it).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Margin(
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    Decimal,
);

impl Margin {
    /// Computes `profit / subtotal × 100`, or 0 when subtotal is not positive.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    /// use tally_core::types::Margin;
    ///
    /// let m = Margin::of(Money::from_dollars(25), Money::from_dollars(100));
    /// assert_eq!(m.percent(), Decimal::from(25));
    ///
    /// assert_eq!(Margin::of(Money::from_dollars(-5), Money::zero()), Margin::zero());
    /// ```
    pub fn of(profit: Money, subtotal: Money) -> Margin {
        if !subtotal.is_positive() {
            return Margin::zero();
        }
        Margin(profit.as_decimal_cents() * Decimal::ONE_HUNDRED / subtotal.as_decimal_cents())
    }

    /// The zero margin.
    #[inline]
    pub const fn zero() -> Self {
        Margin(Decimal::ZERO)
    }

    /// Returns the margin percentage (40 for 40%).
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns the margin rounded to `dp` decimal places, for display.
    pub fn rounded(&self, dp: u32) -> Decimal {
        self.0.round_dp(dp)
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.rounded(1))
    }
}

// =============================================================================
// Catalog Source Kind
// =============================================================================

/// What a sale line (or package component) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    /// A single catalog item (a glass of whiskey, a bottle of ale).
    Item,
    /// A recipe made from several items.
    Recipe,
    /// A bundle sold at its own price.
    Package,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Item => write!(f, "Item"),
            SourceKind::Recipe => write!(f, "Recipe"),
            SourceKind::Package => write!(f, "Package"),
        }
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How a sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Paid at the counter.
    #[default]
    Cash,
    /// Put on the customer's tab.
    Ledger,
    /// Anything else.
    Other,
}

// =============================================================================
// Staff
// =============================================================================

/// Staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Staff,
}

/// Whether a staff member is currently employed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
}

/// A staff member who records sales and earns commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    /// Unique identifier. Also the final leaderboard tie-break.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: StaffStatus,
    /// Assigned commission rule. `None` earns 0 by policy.
    #[serde(default)]
    pub commission_rule_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_range() {
        assert!(Percentage::new("percentage", Decimal::ZERO).is_ok());
        assert!(Percentage::new("percentage", Decimal::ONE_HUNDRED).is_ok());
        let err = Percentage::new("percentage", Decimal::from(-1)).unwrap_err();
        assert_eq!(err.field(), "percentage");
    }

    #[test]
    fn test_percentage_of_negative_profit_stays_negative() {
        let pct = Percentage::whole(15);
        assert_eq!(pct.of(Money::from_dollars(-20)).cents(), -300);
    }

    #[test]
    fn test_margin_zero_subtotal() {
        assert_eq!(Margin::of(Money::from_dollars(10), Money::zero()), Margin::zero());
        assert_eq!(Margin::of(Money::from_dollars(-40), Money::zero()).to_string(), "0%");
    }

    #[test]
    fn test_margin_display() {
        let m = Margin::of(Money::from_cents(1), Money::from_cents(3));
        assert_eq!(m.to_string(), "33.3%");
    }

    #[test]
    fn test_markup_apply() {
        let markup = Markup::new(Decimal::new(25, 1));
        assert_eq!(markup.apply(Money::from_cents(1000)).cents(), 2500);
        assert_eq!(markup.to_string(), "×2.5");
    }

    #[test]
    fn test_quantity_display_and_sign() {
        let q = Quantity::new(Decimal::new(50, 2));
        assert_eq!(q.to_string(), "0.5");
        assert!(q.is_positive());
        assert!(!Quantity::units(0).is_positive());
    }

    #[test]
    fn test_staff_defaults_from_minimal_json() {
        let staff: StaffMember =
            serde_json::from_str(r#"{"id":"s1","name":"Jake"}"#).unwrap();
        assert_eq!(staff.role, Role::Staff);
        assert_eq!(staff.status, StaffStatus::Active);
        assert!(staff.commission_rule_id.is_none());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&SourceKind::Package).unwrap(), "\"PACKAGE\"");
        assert_eq!(serde_json::to_string(&PaymentType::Ledger).unwrap(), "\"LEDGER\"");
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"MANAGER\"");
    }
}
