//! # Sales
//!
//! Line valuation, sale totals and the recorded `Sale`.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SALE CALCULATION                                     │
//! │                                                                         │
//! │  For each line:                                                        │
//! │    line_total  = qty × unit_price      (rounded once, half-even)       │
//! │    line_cost   = qty × unit_cost       (rounded once, half-even)       │
//! │    line_profit = line_total − line_cost                                │
//! │                                                                         │
//! │  Then:                                                                  │
//! │    subtotal = Σ line_total             (exact)                          │
//! │    cost     = Σ line_cost              (exact)                          │
//! │    total    = max(0, subtotal − discount)                               │
//! │    profit   = total − cost             (may be negative)                │
//! │    margin   = profit / subtotal × 100, or 0 when subtotal is 0          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::sale::{totalize_sale, SaleLine};
//! use tally_core::types::{Quantity, SourceKind};
//!
//! let line = SaleLine {
//!     source_type: SourceKind::Item,
//!     source_id: "ale".into(),
//!     name: "Desert Amber Ale".into(),
//!     quantity: Quantity::units(4),
//!     unit_price: Money::from_dollars(25),
//!     unit_cost: Money::from_dollars(10),
//! };
//!
//! let totals = totalize_sale(&[line], Money::from_dollars(150)).unwrap();
//! assert_eq!(totals.total, Money::zero());
//! assert_eq!(totals.profit, Money::from_dollars(-40));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{Margin, PaymentType, Quantity, SourceKind};
use crate::validation::{validate_non_negative_money, validate_quantity};

// =============================================================================
// Sale Line
// =============================================================================

/// One line of a sale.
///
/// Name, price and cost are captured at sale time so the history reproduces
/// without a catalog join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub source_type: SourceKind,
    pub source_id: String,
    /// Name snapshot at sale time.
    pub name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub unit_cost: Money,
}

/// Computed values for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineValuation {
    pub line_total: Money,
    pub line_cost: Money,
    pub line_profit: Money,
}

/// Values a sale line.
///
/// ## Errors
/// - `quantity` not strictly positive
/// - `unitPrice` or `unitCost` negative
/// - `quantity` so large the line total leaves the cent range
pub fn valuate_line(line: &SaleLine) -> ValidationResult<LineValuation> {
    validate_quantity("quantity", line.quantity)?;
    validate_non_negative_money("unitPrice", line.unit_price)?;
    validate_non_negative_money("unitCost", line.unit_cost)?;

    let qty = line.quantity.value();
    let line_total = line
        .unit_price
        .checked_scale(qty)
        .ok_or_else(|| ValidationError::overflow("quantity"))?;
    let line_cost = line
        .unit_cost
        .checked_scale(qty)
        .ok_or_else(|| ValidationError::overflow("quantity"))?;

    Ok(LineValuation {
        line_total,
        line_cost,
        line_profit: line_total - line_cost,
    })
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Aggregate figures of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub cost: Money,
    pub profit: Money,
    pub margin: Margin,
    pub line_count: usize,
}

impl SaleTotals {
    /// Checks the sale has at least one line.
    #[inline]
    pub fn has_lines(&self) -> bool {
        self.line_count > 0
    }
}

/// Totals a sale's lines and applies the discount.
///
/// The discount never pushes the total below zero; profit, however, is not
/// clamped and goes negative when the discount eats past cost.
pub fn totalize_sale(lines: &[SaleLine], discount: Money) -> ValidationResult<SaleTotals> {
    validate_non_negative_money("discount", discount)?;

    let mut subtotal = Money::zero();
    let mut cost = Money::zero();
    for line in lines {
        let valuation = valuate_line(line)?;
        subtotal = subtotal
            .checked_add(valuation.line_total)
            .ok_or_else(|| ValidationError::overflow("subtotal"))?;
        cost = cost
            .checked_add(valuation.line_cost)
            .ok_or_else(|| ValidationError::overflow("cost"))?;
    }

    let total = (subtotal - discount).clamp_non_negative();
    let profit = total - cost;

    Ok(SaleTotals {
        subtotal,
        discount,
        total,
        cost,
        profit,
        margin: Margin::of(profit, subtotal),
        line_count: lines.len(),
    })
}

// =============================================================================
// Sale
// =============================================================================

/// A sale as submitted, before totals and commission are computed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    pub id: String,
    pub datetime: DateTime<Utc>,
    pub staff_id: String,
    #[serde(default)]
    pub customer: Option<String>,
    pub lines: Vec<SaleLine>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub payment_type: PaymentType,
}

/// A recorded sale. Append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub datetime: DateTime<Utc>,
    pub staff_id: String,
    #[serde(default)]
    pub customer: Option<String>,
    pub lines: Vec<SaleLine>,
    pub discount: Money,
    pub subtotal: Money,
    pub total: Money,
    pub cost: Money,
    pub profit: Money,
    pub commission: Money,
    #[serde(default)]
    pub payment_type: PaymentType,
}

impl Sale {
    /// Assembles a sale from a draft, its totals and the commission earned.
    pub fn from_draft(draft: SaleDraft, totals: &SaleTotals, commission: Money) -> Sale {
        Sale {
            id: draft.id,
            datetime: draft.datetime,
            staff_id: draft.staff_id,
            customer: draft.customer,
            lines: draft.lines,
            discount: totals.discount,
            subtotal: totals.subtotal,
            total: totals.total,
            cost: totals.cost,
            profit: totals.profit,
            commission,
            payment_type: draft.payment_type,
        }
    }

    /// Margin of this sale, from its stored figures.
    pub fn margin(&self) -> Margin {
        Margin::of(self.profit, self.subtotal)
    }

    /// Checks whether the sale falls in the half-open range `[start, end)`.
    #[inline]
    pub fn is_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.datetime >= start && self.datetime < end
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ValidationError;
    use rust_decimal::Decimal;

    pub(crate) fn line(qty: Quantity, price_cents: i64, cost_cents: i64) -> SaleLine {
        SaleLine {
            source_type: SourceKind::Item,
            source_id: "ale".to_string(),
            name: "Desert Amber Ale".to_string(),
            quantity: qty,
            unit_price: Money::from_cents(price_cents),
            unit_cost: Money::from_cents(cost_cents),
        }
    }

    #[test]
    fn test_valuate_line() {
        let v = valuate_line(&line(Quantity::units(3), 350, 120)).unwrap();
        assert_eq!(v.line_total.cents(), 1050);
        assert_eq!(v.line_cost.cents(), 360);
        assert_eq!(v.line_profit.cents(), 690);
    }

    #[test]
    fn test_valuate_line_fractional_quantity() {
        // 0.25 × $2.50 = $0.625 → $0.62
        let v = valuate_line(&line(Quantity::new(Decimal::new(25, 2)), 250, 100)).unwrap();
        assert_eq!(v.line_total.cents(), 62);
        assert_eq!(v.line_cost.cents(), 25);
    }

    #[test]
    fn test_valuate_line_rejects_bad_input() {
        let err = valuate_line(&line(Quantity::units(0), 350, 120)).unwrap_err();
        assert_eq!(err, ValidationError::must_be_positive("quantity"));

        let err = valuate_line(&line(Quantity::units(1), -1, 120)).unwrap_err();
        assert_eq!(err.field(), "unitPrice");

        let err = valuate_line(&line(Quantity::units(1), 350, -5)).unwrap_err();
        assert_eq!(err.field(), "unitCost");
    }

    #[test]
    fn test_totalize_sale() {
        let lines = vec![
            line(Quantity::units(2), 350, 120),
            line(Quantity::units(1), 1500, 600),
        ];
        let totals = totalize_sale(&lines, Money::from_cents(200)).unwrap();

        assert_eq!(totals.subtotal.cents(), 2200);
        assert_eq!(totals.cost.cents(), 840);
        assert_eq!(totals.total.cents(), 2000);
        assert_eq!(totals.profit.cents(), 1160);
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.margin, Margin::of(Money::from_cents(1160), Money::from_cents(2200)));
    }

    #[test]
    fn test_discount_beyond_subtotal() {
        // subtotal $100, discount $150, cost $40
        let lines = vec![line(Quantity::units(4), 2500, 1000)];
        let totals = totalize_sale(&lines, Money::from_dollars(150)).unwrap();

        assert_eq!(totals.subtotal, Money::from_dollars(100));
        assert_eq!(totals.total, Money::zero());
        assert_eq!(totals.profit, Money::from_dollars(-40));
        assert_eq!(totals.margin.percent(), Decimal::from(-40));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let err = totalize_sale(&[], Money::from_cents(-1)).unwrap_err();
        assert_eq!(err, ValidationError::must_not_be_negative("discount"));
    }

    #[test]
    fn test_huge_quantity_is_rejected() {
        let qty = Quantity::new(Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0));
        let err = valuate_line(&line(qty, 10_000_000_000, 0)).unwrap_err();
        assert_eq!(err, ValidationError::overflow("quantity"));

        let err = totalize_sale(&[line(qty, 10_000_000_000, 0)], Money::zero()).unwrap_err();
        assert_eq!(err.field(), "quantity");
    }

    #[test]
    fn test_subtotal_overflow_is_rejected() {
        let lines = vec![
            line(Quantity::units(1), i64::MAX, 0),
            line(Quantity::units(1), 1, 0),
        ];
        let err = totalize_sale(&lines, Money::zero()).unwrap_err();
        assert_eq!(err, ValidationError::overflow("subtotal"));

        let lines = vec![
            line(Quantity::units(1), 0, i64::MAX),
            line(Quantity::units(1), 0, 1),
        ];
        let err = totalize_sale(&lines, Money::zero()).unwrap_err();
        assert_eq!(err, ValidationError::overflow("cost"));
    }

    #[test]
    fn test_empty_sale() {
        let totals = totalize_sale(&[], Money::zero()).unwrap();
        assert_eq!(totals.subtotal, Money::zero());
        assert_eq!(totals.margin, Margin::zero());
        assert!(!totals.has_lines());
    }

    #[test]
    fn test_sale_window_is_half_open() {
        use chrono::TimeZone;
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 7, 0, 0, 0).unwrap();
        let draft = SaleDraft {
            id: "s1".to_string(),
            datetime: start,
            staff_id: "jake".to_string(),
            customer: None,
            lines: Vec::new(),
            discount: Money::zero(),
            payment_type: PaymentType::Cash,
        };
        let totals = totalize_sale(&draft.lines, draft.discount).unwrap();
        let mut sale = Sale::from_draft(draft, &totals, Money::zero());

        assert!(sale.is_within(start, end));
        sale.datetime = end;
        assert!(!sale.is_within(start, end));
    }
}
