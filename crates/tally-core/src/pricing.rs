//! # Price Resolver
//!
//! Determines the current sell price of items, recipes and packages.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_sell_price(item, unit?, as_of)                                 │
//! │                                                                         │
//! │  1. Candidates = item.sell_prices where                                 │
//! │        effective_from ≤ as_of                                           │
//! │        effective_to is None  OR  effective_to ≥ as_of                   │
//! │        unit == requested unit (when one is requested)                   │
//! │                                                                         │
//! │  2. Latest effective_from wins (earlier-listed on a tie)                │
//! │                                                                         │
//! │  3. No candidate → buy_price × default markup (2.0)                     │
//! │                                                                         │
//! │  Never fails: every item has a buy price.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use ts_rs::TS;

use crate::catalog::{Catalog, CatalogItem, Package, Recipe, SellPrice};
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Margin, Markup};

/// Markup applied to an item's buy price when no sell price is current.
pub const DEFAULT_MARKUP: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Markup applied to a recipe's calculated cost (2.5).
pub const RECIPE_MARKUP: Decimal = Decimal::from_parts(25, 0, 0, false, 1);

// =============================================================================
// Pricing Policy
// =============================================================================

/// The markups used when no explicit price exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub default_markup: Markup,
    pub recipe_markup: Markup,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            default_markup: Markup::new(DEFAULT_MARKUP),
            recipe_markup: Markup::new(RECIPE_MARKUP),
        }
    }
}

/// Where a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceOrigin {
    /// A current `SellPrice` record.
    SellPrice,
    /// Item buy price × default markup.
    DefaultMarkup,
    /// Recipe calculated cost × recipe markup.
    RecipeMarkup,
    /// A package's independent bundle price.
    Bundle,
}

/// A resolved price together with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrice {
    pub price: Money,
    pub origin: PriceOrigin,
}

// =============================================================================
// Items
// =============================================================================

/// Returns the sell price record current at `as_of`, if any.
pub fn current_sell_price<'a>(
    item: &'a CatalogItem,
    unit: Option<&str>,
    as_of: DateTime<Utc>,
) -> Option<&'a SellPrice> {
    item.sell_prices
        .iter()
        .filter(|p| p.is_current_at(as_of))
        .filter(|p| unit.map_or(true, |u| p.unit == u))
        .fold(None, |best: Option<&SellPrice>, candidate| match best {
            // Strictly later only, so the first-listed record keeps a tie.
            Some(b) if candidate.effective_from <= b.effective_from => Some(b),
            _ => Some(candidate),
        })
}

/// Resolves an item's price and reports where it came from.
pub fn quote_item(
    item: &CatalogItem,
    unit: Option<&str>,
    as_of: DateTime<Utc>,
    policy: &PricingPolicy,
) -> ResolvedPrice {
    match current_sell_price(item, unit, as_of) {
        Some(price) => ResolvedPrice {
            price: price.sell_price,
            origin: PriceOrigin::SellPrice,
        },
        None => ResolvedPrice {
            price: policy.default_markup.apply(item.buy_price),
            origin: PriceOrigin::DefaultMarkup,
        },
    }
}

/// Resolves the current sell price of an item.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tally_core::catalog::CatalogItem;
/// use tally_core::money::Money;
/// use tally_core::pricing::{resolve_sell_price, PricingPolicy};
///
/// let item = CatalogItem {
///     id: "whiskey".into(),
///     name: "Rattlesnake Whiskey".into(),
///     category: "Spirits".into(),
///     unit: "bottle".into(),
///     buy_price: Money::from_dollars(10),
///     sell_prices: vec![],
///     is_active: true,
/// };
///
/// // No sell price on record: buy price × 2.0
/// let price = resolve_sell_price(&item, None, Utc::now(), &PricingPolicy::default());
/// assert_eq!(price, Money::from_dollars(20));
/// ```
pub fn resolve_sell_price(
    item: &CatalogItem,
    unit: Option<&str>,
    as_of: DateTime<Utc>,
    policy: &PricingPolicy,
) -> Money {
    quote_item(item, unit, as_of, policy).price
}

// =============================================================================
// Recipes & Packages
// =============================================================================

/// Derived pricing of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecipePricing {
    pub calculated_cost: Money,
    pub suggested_price: Money,
    /// (suggested − cost) / suggested × 100.
    pub suggested_margin: Margin,
}

/// Computes a recipe's cost, suggested price and suggested margin.
pub fn price_recipe(
    recipe: &Recipe,
    catalog: &Catalog<'_>,
    policy: &PricingPolicy,
) -> CoreResult<RecipePricing> {
    let calculated_cost = catalog.recipe_cost(recipe)?;
    let suggested_price = policy.recipe_markup.apply(calculated_cost);
    Ok(RecipePricing {
        calculated_cost,
        suggested_price,
        suggested_margin: Margin::of(suggested_price - calculated_cost, suggested_price),
    })
}

/// Resolves a recipe's sell price: calculated cost × recipe markup.
pub fn resolve_recipe_price(
    recipe: &Recipe,
    catalog: &Catalog<'_>,
    policy: &PricingPolicy,
) -> CoreResult<Money> {
    Ok(price_recipe(recipe, catalog, policy)?.suggested_price)
}

/// Resolves a package's sell price: its bundle price, independent of contents.
pub fn resolve_package_price(package: &Package) -> Money {
    package.bundle_sell_price
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{ingredient, item};
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn price(unit: &str, cents: i64, from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> SellPrice {
        SellPrice {
            item_id: "whiskey".to_string(),
            unit: unit.to_string(),
            sell_price: Money::from_cents(cents),
            effective_from: from,
            effective_to: to,
        }
    }

    #[test]
    fn test_default_markup_without_sell_price() {
        let whiskey = item("whiskey", 1000);
        let policy = PricingPolicy::default();

        let quote = quote_item(&whiskey, None, at(10), &policy);
        assert_eq!(quote.price.cents(), 2000);
        assert_eq!(quote.origin, PriceOrigin::DefaultMarkup);
    }

    #[test]
    fn test_latest_effective_price_wins() {
        let mut whiskey = item("whiskey", 1000);
        whiskey.sell_prices = vec![
            price("glass", 300, at(1), None),
            price("glass", 350, at(5), None),
            price("glass", 325, at(3), None),
        ];

        let resolved = resolve_sell_price(&whiskey, Some("glass"), at(10), &PricingPolicy::default());
        assert_eq!(resolved.cents(), 350);
    }

    #[test]
    fn test_expired_and_future_prices_are_not_current() {
        let mut whiskey = item("whiskey", 1000);
        whiskey.sell_prices = vec![
            price("glass", 300, at(1), Some(at(4))),
            price("glass", 999, at(20), None),
        ];
        let policy = PricingPolicy::default();

        assert_eq!(resolve_sell_price(&whiskey, None, at(3), &policy).cents(), 300);
        // effective_to is inclusive
        assert_eq!(resolve_sell_price(&whiskey, None, at(4), &policy).cents(), 300);
        // gap between the two: fall back to markup
        assert_eq!(
            resolve_sell_price(&whiskey, None, at(4) + Duration::seconds(1), &policy).cents(),
            2000
        );
        assert_eq!(resolve_sell_price(&whiskey, None, at(20), &policy).cents(), 999);
    }

    #[test]
    fn test_unit_filter() {
        let mut whiskey = item("whiskey", 1000);
        whiskey.sell_prices = vec![
            price("glass", 350, at(1), None),
            price("bottle", 4500, at(2), None),
        ];
        let policy = PricingPolicy::default();

        assert_eq!(resolve_sell_price(&whiskey, Some("glass"), at(10), &policy).cents(), 350);
        assert_eq!(resolve_sell_price(&whiskey, Some("bottle"), at(10), &policy).cents(), 4500);
        assert_eq!(resolve_sell_price(&whiskey, Some("keg"), at(10), &policy).cents(), 2000);
        // no unit requested: latest across all units
        assert_eq!(resolve_sell_price(&whiskey, None, at(10), &policy).cents(), 4500);
    }

    #[test]
    fn test_equal_effective_from_keeps_first_listed() {
        let mut whiskey = item("whiskey", 1000);
        whiskey.sell_prices = vec![price("glass", 400, at(2), None), price("glass", 450, at(2), None)];

        let current = current_sell_price(&whiskey, Some("glass"), at(3)).unwrap();
        assert_eq!(current.sell_price.cents(), 400);
    }

    #[test]
    fn test_recipe_pricing() {
        let items = vec![item("whiskey", 2500), item("syrup", 500)];
        let recipe = Recipe {
            id: "r-fire".to_string(),
            name: "Dragon's Fire".to_string(),
            category: "Cocktails".to_string(),
            difficulty: 3,
            ingredients: vec![
                ingredient("whiskey", Decimal::from(2)),
                ingredient("syrup", Decimal::new(5, 1)),
            ],
            is_active: true,
        };
        let catalog = Catalog::new(&items, &[], &[]);

        let pricing = price_recipe(&recipe, &catalog, &PricingPolicy::default()).unwrap();
        assert_eq!(pricing.calculated_cost.cents(), 5250);
        assert_eq!(pricing.suggested_price.cents(), 13125);
        assert_eq!(pricing.suggested_margin.percent(), Decimal::from(60));
    }

    #[test]
    fn test_package_price_is_bundle_price() {
        let package = Package {
            id: "p1".to_string(),
            name: "Cowboy Breakfast".to_string(),
            bundle_sell_price: Money::from_cents(1250),
            items: Vec::new(),
            is_active: true,
        };
        assert_eq!(resolve_package_price(&package).cents(), 1250);
    }
}
