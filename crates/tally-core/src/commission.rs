//! # Commission Rules
//!
//! Evaluates what a staff member earns on a sale.
//!
//! ## Rule Variants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      COMMISSION RULES                                   │
//! │                                                                         │
//! │  FLAT_PER_SALE       amount              → amount (sale has lines)     │
//! │                                                                         │
//! │  PERCENT_OF_PROFIT   percentage          → profit × pct / 100          │
//! │                                            (negative profit stays      │
//! │                                             negative: claw-back)       │
//! │                                                                         │
//! │  TIERED              tiers[]             → highest threshold ≤ profit  │
//! │                        threshold           percentage: profit × v/100  │
//! │                        kind                flat:       v               │
//! │                        value               below every threshold: 0    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Rules arrive tagged: `{ "id", "name", "type", "params" }`.
//! An unknown `type` or malformed `params` is rejected while the rule is
//! built, so evaluation itself can never fail.
//!
//! ```rust
//! use tally_core::commission::CommissionRule;
//! use tally_core::money::Money;
//!
//! let rule: CommissionRule = serde_json::from_str(r#"{
//!     "id": "tiered", "name": "Tiered", "type": "TIERED",
//!     "params": { "tiers": [
//!         { "threshold": 5000, "type": "percentage", "value": 20 },
//!         { "threshold": 0,    "type": "percentage", "value": 10 }
//!     ]}
//! }"#).unwrap();
//!
//! assert_eq!(rule.kind.commission_on(Money::from_dollars(80), true), Money::from_dollars(16));
//! assert_eq!(rule.kind.commission_on(Money::from_dollars(30), true), Money::from_dollars(3));
//! ```

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::sale::SaleTotals;
use crate::types::Percentage;

/// Wire tags of the rule variants.
pub const FLAT_PER_SALE: &str = "FLAT_PER_SALE";
pub const PERCENT_OF_PROFIT: &str = "PERCENT_OF_PROFIT";
pub const TIERED: &str = "TIERED";

// =============================================================================
// Rule Types
// =============================================================================

/// A named commission rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCommissionRule", into = "RawCommissionRule")]
pub struct CommissionRule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
}

/// The closed set of commission calculations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// A fixed amount for every sale with at least one line.
    FlatPerSale { amount: Money },
    /// A share of the sale's profit.
    PercentOfProfit { percentage: Percentage },
    /// The reward of the highest threshold the profit reaches.
    Tiered { schedule: TierSchedule },
}

/// One tier of a tiered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    /// Minimum profit (inclusive) for this tier to apply.
    pub threshold: Money,
    pub reward: TierReward,
}

/// What a tier pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierReward {
    /// `profit × value / 100`
    Percentage(Percentage),
    /// A fixed amount.
    Flat(Money),
}

/// Tiers kept in descending threshold order.
///
/// The sort is stable: among equal thresholds the earlier-listed tier stays
/// first and is the one that pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSchedule(Vec<Tier>);

impl TierSchedule {
    /// Builds a schedule, sorting tiers by threshold descending.
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by(|a, b| b.threshold.cmp(&a.threshold));
        TierSchedule(tiers)
    }

    /// Tiers, highest threshold first.
    pub fn tiers(&self) -> &[Tier] {
        &self.0
    }

    /// The tier that applies to `profit`, if any.
    pub fn tier_for(&self, profit: Money) -> Option<&Tier> {
        self.0.iter().find(|t| t.threshold <= profit)
    }
}

// =============================================================================
// Evaluation
// =============================================================================

impl RuleKind {
    /// Wire tag of this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            RuleKind::FlatPerSale { .. } => FLAT_PER_SALE,
            RuleKind::PercentOfProfit { .. } => PERCENT_OF_PROFIT,
            RuleKind::Tiered { .. } => TIERED,
        }
    }

    /// Commission earned on a sale with the given profit.
    ///
    /// Total over every profit value; never fails.
    pub fn commission_on(&self, profit: Money, has_lines: bool) -> Money {
        match self {
            RuleKind::FlatPerSale { amount } => {
                if has_lines {
                    *amount
                } else {
                    Money::zero()
                }
            }
            RuleKind::PercentOfProfit { percentage } => percentage.of(profit),
            RuleKind::Tiered { schedule } => match schedule.tier_for(profit) {
                Some(Tier {
                    reward: TierReward::Percentage(pct),
                    ..
                }) => pct.of(profit),
                Some(Tier {
                    reward: TierReward::Flat(amount),
                    ..
                }) => *amount,
                None => Money::zero(),
            },
        }
    }
}

impl CommissionRule {
    /// Commission earned on a totalled sale.
    pub fn evaluate(&self, totals: &SaleTotals) -> Money {
        self.kind.commission_on(totals.profit, totals.has_lines())
    }
}

/// Commission for a sale under an optional rule.
///
/// Staff without a rule earn nothing.
pub fn commission_for(rule: Option<&CommissionRule>, totals: &SaleTotals) -> Money {
    rule.map_or(Money::zero(), |r| r.evaluate(totals))
}

// =============================================================================
// Wire Conversion
// =============================================================================

/// Tagged wire shape of a commission rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommissionRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Deserialize)]
struct FlatParams {
    amount: Value,
}

#[derive(Deserialize)]
struct PercentParams {
    percentage: Value,
}

#[derive(Deserialize)]
struct TieredParams {
    tiers: Vec<RawTier>,
}

#[derive(Deserialize)]
struct RawTier {
    threshold: Value,
    #[serde(alias = "type")]
    kind: String,
    value: Value,
}

impl TryFrom<RawCommissionRule> for CommissionRule {
    type Error = ValidationError;

    fn try_from(raw: RawCommissionRule) -> ValidationResult<Self> {
        let kind = match raw.kind.as_str() {
            FLAT_PER_SALE => {
                let params: FlatParams = parse_params(raw.params)?;
                let amount = cents_param("params.amount", &params.amount)?;
                if amount.is_negative() {
                    return Err(ValidationError::must_not_be_negative("params.amount"));
                }
                RuleKind::FlatPerSale { amount }
            }
            PERCENT_OF_PROFIT => {
                let params: PercentParams = parse_params(raw.params)?;
                let value = decimal_param("params.percentage", &params.percentage)?;
                RuleKind::PercentOfProfit {
                    percentage: Percentage::new("params.percentage", value)?,
                }
            }
            TIERED => {
                let params: TieredParams = parse_params(raw.params)?;
                let tiers = params
                    .tiers
                    .iter()
                    .enumerate()
                    .map(|(i, t)| parse_tier(i, t))
                    .collect::<ValidationResult<Vec<_>>>()?;
                RuleKind::Tiered {
                    schedule: TierSchedule::new(tiers),
                }
            }
            other => {
                return Err(ValidationError::NotAllowed {
                    field: "type".to_string(),
                    value: other.to_string(),
                    allowed: vec![
                        FLAT_PER_SALE.to_string(),
                        PERCENT_OF_PROFIT.to_string(),
                        TIERED.to_string(),
                    ],
                })
            }
        };

        Ok(CommissionRule {
            id: raw.id,
            name: raw.name,
            kind,
        })
    }
}

impl From<CommissionRule> for RawCommissionRule {
    fn from(rule: CommissionRule) -> Self {
        let params = match &rule.kind {
            RuleKind::FlatPerSale { amount } => json!({ "amount": amount.cents() }),
            RuleKind::PercentOfProfit { percentage } => {
                json!({ "percentage": decimal_json(percentage.value()) })
            }
            RuleKind::Tiered { schedule } => {
                let tiers: Vec<Value> = schedule
                    .tiers()
                    .iter()
                    .map(|t| match t.reward {
                        TierReward::Percentage(pct) => json!({
                            "threshold": t.threshold.cents(),
                            "type": "percentage",
                            "value": decimal_json(pct.value()),
                        }),
                        TierReward::Flat(amount) => json!({
                            "threshold": t.threshold.cents(),
                            "type": "flat",
                            "value": amount.cents(),
                        }),
                    })
                    .collect();
                json!({ "tiers": tiers })
            }
        };

        RawCommissionRule {
            kind: rule.kind.tag().to_string(),
            id: rule.id,
            name: rule.name,
            params,
        }
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Value) -> ValidationResult<T> {
    serde_json::from_value(params).map_err(|e| ValidationError::InvalidFormat {
        field: "params".to_string(),
        reason: e.to_string(),
    })
}

fn parse_tier(index: usize, raw: &RawTier) -> ValidationResult<Tier> {
    let threshold = cents_param(&format!("params.tiers[{}].threshold", index), &raw.threshold)?;
    let value_field = format!("params.tiers[{}].value", index);

    let reward = match raw.kind.as_str() {
        "percentage" => {
            let value = decimal_param(&value_field, &raw.value)?;
            TierReward::Percentage(Percentage::new(&value_field, value)?)
        }
        "flat" => {
            let amount = cents_param(&value_field, &raw.value)?;
            if amount.is_negative() {
                return Err(ValidationError::must_not_be_negative(value_field));
            }
            TierReward::Flat(amount)
        }
        other => {
            return Err(ValidationError::NotAllowed {
                field: format!("params.tiers[{}].type", index),
                value: other.to_string(),
                allowed: vec!["percentage".to_string(), "flat".to_string()],
            })
        }
    };

    Ok(Tier { threshold, reward })
}

/// Reads a JSON number as an exact decimal.
fn decimal_param(field: &str, value: &Value) -> ValidationResult<Decimal> {
    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a number".to_string(),
    };
    let text = match value {
        Value::Number(number) => number.to_string(),
        _ => return Err(invalid()),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid())
}

/// Reads a JSON number of whole cents.
fn cents_param(field: &str, value: &Value) -> ValidationResult<Money> {
    let cents = decimal_param(field, value)?;
    if !cents.fract().is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number of cents".to_string(),
        });
    }
    cents
        .to_i64()
        .map(Money::from_cents)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "out of range".to_string(),
        })
}

fn decimal_json(value: Decimal) -> Value {
    serde_json::to_value(value.to_f64().unwrap_or_default()).unwrap_or(Value::Null)
}

// =============================================================================
// Unit Tests
// =============================================================================
