//! # Demo Snapshot Generator
//!
//! Builds a frontier-saloon snapshot for development: six staff on the three
//! rule types, a spirits/beer/food catalog, five recipes, five packages and
//! a couple of weeks of sales.
//!
//! Every id, timestamp and choice comes from one `StdRng` seeded by the
//! caller, so the same seed and `now` give the same snapshot. Sales go
//! through `Engine::record_sale`, so their totals and commissions are the
//! engine's own.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tally_core::catalog::{CatalogItem, Package, PackageItem, Recipe, RecipeIngredient, SellPrice};
use tally_core::commission::{RuleKind, Tier, TierReward, TierSchedule};
use tally_core::{
    CommissionRule, CoreResult, Engine, EngineConfig, FixedClock, Money, PaymentType, Percentage,
    Quantity, Role, SaleDraft, SaleLine, Snapshot, SourceKind, StaffMember,
};
use tracing::debug;
use uuid::Builder;

/// Seeding parameters.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub seed: u64,
    /// Number of sales to generate.
    pub sales: usize,
    /// Sales are spread over this many days before `now`.
    pub days: i64,
    pub now: DateTime<Utc>,
}

/// (name, category, purchase unit, buy price in cents)
const ITEMS: &[(&str, &str, &str, i64)] = &[
    ("Dragon's Breath Whiskey", "Spirits", "bottle", 2500),
    ("Tombstone Rye", "Spirits", "bottle", 3000),
    ("Prairie Fire Bourbon", "Spirits", "bottle", 2200),
    ("Snake Oil Gin", "Spirits", "bottle", 1800),
    ("Cactus Flower Tequila", "Spirits", "bottle", 2000),
    ("Saloon Lager", "Beer", "keg", 4500),
    ("Desert Amber Ale", "Beer", "bottle", 350),
    ("Frontier Stout", "Beer", "bottle", 400),
    ("Sarsaparilla", "Soft Drinks", "bottle", 200),
    ("Ginger Beer", "Soft Drinks", "bottle", 250),
    ("Simple Syrup", "Mixers", "bottle", 500),
    ("Beef Jerky", "Food", "pound", 800),
    ("Hardtack", "Food", "dozen", 300),
    ("Salted Pork", "Food", "pound", 600),
    ("Prairie Beans", "Food", "pound", 250),
];

/// (item index, selling unit, price in cents)
const SELL_PRICES: &[(usize, &str, i64)] = &[
    (0, "glass", 350),
    (0, "bottle", 5000),
    (1, "glass", 400),
    (1, "bottle", 6000),
    (5, "glass", 200),
    (6, "bottle", 600),
    (11, "serving", 400),
    (12, "piece", 100),
];

/// Items sold over the counter in their purchase unit.
const COUNTER_ITEMS: &[usize] = &[0, 1, 2, 6, 7, 8, 9, 11];

/// (name, category, difficulty, [(item index, quantity in hundredths, card unit)])
const RECIPES: &[(&str, &str, u8, &[(usize, i64, &str)])] = &[
    ("Dragon's Fire", "Cocktails", 3, &[(0, 10, "oz"), (9, 100, "bottle"), (10, 5, "oz")]),
    ("Tombstone Mule", "Cocktails", 2, &[(1, 10, "oz"), (9, 100, "bottle")]),
    ("Prairie Sunrise", "Cocktails", 2, &[(4, 10, "oz"), (8, 100, "bottle"), (10, 5, "oz")]),
    ("Cowboy's Plate", "Food", 3, &[(13, 50, "lb"), (14, 50, "lb"), (12, 25, "piece")]),
    ("Trail Mix Special", "Food", 1, &[(11, 25, "lb"), (12, 25, "piece")]),
];

/// (name, bundle price in cents, [(kind, index, quantity)])
const PACKAGES: &[(&str, i64, &[(SourceKind, usize, i64)])] = &[
    ("Poker Night", 3500, &[(SourceKind::Item, 0, 1), (SourceKind::Recipe, 4, 2)]),
    ("Rancher's Supper", 2500, &[(SourceKind::Recipe, 3, 2), (SourceKind::Item, 6, 2)]),
    ("Traveler's Kit", 1500, &[(SourceKind::Item, 11, 1), (SourceKind::Item, 12, 1)]),
    (
        "Saturday Night Special",
        4500,
        &[(SourceKind::Recipe, 0, 3), (SourceKind::Recipe, 1, 3)],
    ),
    (
        "Saloon Sampler",
        2000,
        &[(SourceKind::Item, 6, 2), (SourceKind::Item, 7, 2), (SourceKind::Item, 8, 1)],
    ),
];

/// (name, role, rule index)
const STAFF: &[(&str, Role, usize)] = &[
    ("Silas Blackwood", Role::Admin, 2),
    ("Martha \"Red\" O'Connor", Role::Manager, 1),
    ("Jake \"Mustang\" Miller", Role::Staff, 0),
    ("Belle \"Songbird\" Davis", Role::Staff, 1),
    ("Frank \"Iron Horse\" Thompson", Role::Staff, 0),
    ("Eliza \"Doc\" Morrison", Role::Staff, 2),
];

const CUSTOMERS: &[&str] = &[
    "Wild Bill",
    "Calamity Jane",
    "Doc Holliday",
    "Annie Oakley",
    "Butch Cassidy",
];

/// Builds the demo snapshot.
pub fn demo_snapshot(options: &SeedOptions, config: &EngineConfig) -> CoreResult<Snapshot> {
    let mut rng = StdRng::seed_from_u64(options.seed);

    let commission_rules = commission_rules(&mut rng);
    let staff = STAFF
        .iter()
        .map(|(name, role, rule)| StaffMember {
            id: next_id(&mut rng),
            name: name.to_string(),
            role: *role,
            status: Default::default(),
            commission_rule_id: Some(commission_rules[*rule].id.clone()),
        })
        .collect();

    let items = items(&mut rng, options.now);
    let recipes = recipes(&mut rng, &items);
    let packages = packages(&mut rng, &items, &recipes);

    let catalog = Snapshot {
        items,
        recipes,
        packages,
        commission_rules,
        staff,
        sales: Vec::new(),
    };

    let mut engine = Engine::new(catalog, config.clone(), FixedClock::new(options.now))?;
    for draft in sale_drafts(&mut rng, &engine, options)? {
        engine.record_sale(draft)?;
    }

    let snapshot = engine.into_snapshot();
    debug!(
        seed = options.seed,
        items = snapshot.items.len(),
        sales = snapshot.sales.len(),
        "Generated demo snapshot"
    );
    Ok(snapshot)
}

/// A v4 UUID drawn from `rng`.
fn next_id(rng: &mut StdRng) -> String {
    Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

fn hundredths(value: i64) -> Quantity {
    Quantity::new(Decimal::new(value, 2))
}

fn commission_rules(rng: &mut StdRng) -> Vec<CommissionRule> {
    vec![
        CommissionRule {
            id: next_id(rng),
            name: "Flat $5 per sale".to_string(),
            kind: RuleKind::FlatPerSale {
                amount: Money::from_dollars(5),
            },
        },
        CommissionRule {
            id: next_id(rng),
            name: "15% of profit".to_string(),
            kind: RuleKind::PercentOfProfit {
                percentage: Percentage::whole(15),
            },
        },
        CommissionRule {
            id: next_id(rng),
            name: "Tiered: 20% over $50 profit, else 10%".to_string(),
            kind: RuleKind::Tiered {
                schedule: TierSchedule::new(vec![
                    Tier {
                        threshold: Money::from_dollars(50),
                        reward: TierReward::Percentage(Percentage::whole(20)),
                    },
                    Tier {
                        threshold: Money::zero(),
                        reward: TierReward::Percentage(Percentage::whole(10)),
                    },
                ]),
            },
        },
    ]
}

fn items(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CatalogItem> {
    let listed = now - Duration::days(90);

    let mut items: Vec<CatalogItem> = ITEMS
        .iter()
        .map(|(name, category, unit, buy_cents)| CatalogItem {
            id: next_id(rng),
            name: name.to_string(),
            category: category.to_string(),
            unit: unit.to_string(),
            buy_price: Money::from_cents(*buy_cents),
            sell_prices: Vec::new(),
            is_active: true,
        })
        .collect();

    for (index, unit, cents) in SELL_PRICES {
        let item = &mut items[*index];
        item.sell_prices.push(SellPrice {
            item_id: item.id.clone(),
            unit: unit.to_string(),
            sell_price: Money::from_cents(*cents),
            effective_from: listed,
            effective_to: None,
        });
    }

    items
}

fn recipes(rng: &mut StdRng, items: &[CatalogItem]) -> Vec<Recipe> {
    RECIPES
        .iter()
        .map(|(name, category, difficulty, ingredients)| Recipe {
            id: next_id(rng),
            name: name.to_string(),
            category: category.to_string(),
            difficulty: *difficulty,
            ingredients: ingredients
                .iter()
                .map(|(index, qty, unit)| RecipeIngredient {
                    item_id: items[*index].id.clone(),
                    quantity: hundredths(*qty),
                    unit_override: Some(unit.to_string()),
                })
                .collect(),
            is_active: true,
        })
        .collect()
}

fn packages(rng: &mut StdRng, items: &[CatalogItem], recipes: &[Recipe]) -> Vec<Package> {
    PACKAGES
        .iter()
        .map(|(name, cents, contents)| Package {
            id: next_id(rng),
            name: name.to_string(),
            bundle_sell_price: Money::from_cents(*cents),
            items: contents
                .iter()
                .map(|(kind, index, qty)| PackageItem {
                    source_type: *kind,
                    source_id: match kind {
                        SourceKind::Recipe => recipes[*index].id.clone(),
                        _ => items[*index].id.clone(),
                    },
                    quantity: Quantity::units(*qty),
                })
                .collect(),
            is_active: true,
        })
        .collect()
}

fn sale_drafts(
    rng: &mut StdRng,
    engine: &Engine<FixedClock>,
    options: &SeedOptions,
) -> CoreResult<Vec<SaleDraft>> {
    let snapshot = engine.snapshot();
    let span_minutes = (options.days * 24 * 60).max(1);

    // oldest first, so the history is in recording order
    let mut offsets: Vec<i64> = (0..options.sales)
        .map(|_| rng.gen_range(1..=span_minutes))
        .collect();
    offsets.sort_unstable_by(|a, b| b.cmp(a));

    let mut drafts = Vec::with_capacity(options.sales);
    for offset in offsets {
        let staff = &snapshot.staff[rng.gen_range(0..snapshot.staff.len())];

        let lines = if rng.gen_bool(0.3) {
            let package = &snapshot.packages[rng.gen_range(0..snapshot.packages.len())];
            vec![engine.quote_line(SourceKind::Package, &package.id, Quantity::units(1), None)?]
        } else {
            let count = rng.gen_range(1..=3);
            let mut lines: Vec<SaleLine> = Vec::with_capacity(count);
            for _ in 0..count {
                let quantity = Quantity::units(rng.gen_range(1..=3));
                let line = if rng.gen_bool(0.5) {
                    let recipe = &snapshot.recipes[rng.gen_range(0..snapshot.recipes.len())];
                    engine.quote_line(SourceKind::Recipe, &recipe.id, quantity, None)?
                } else {
                    let index = COUNTER_ITEMS[rng.gen_range(0..COUNTER_ITEMS.len())];
                    let item = &snapshot.items[index];
                    engine.quote_line(SourceKind::Item, &item.id, quantity, Some(&item.unit))?
                };
                lines.push(line);
            }
            lines
        };

        let discount = if rng.gen_bool(0.1) {
            Money::from_dollars(rng.gen_range(1..=5))
        } else {
            Money::zero()
        };

        let customer = if rng.gen_bool(0.6) {
            CUSTOMERS.choose(rng).map(|c| c.to_string())
        } else {
            None
        };

        let payment_type = match rng.gen_range(0..10) {
            0..=5 => PaymentType::Cash,
            6..=8 => PaymentType::Ledger,
            _ => PaymentType::Other,
        };

        drafts.push(SaleDraft {
            id: next_id(rng),
            datetime: options.now - Duration::minutes(offset),
            staff_id: staff.id.clone(),
            customer,
            lines,
            discount,
            payment_type,
        });
    }

    Ok(drafts)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tally_core::ReportPeriod;

    fn options(seed: u64) -> SeedOptions {
        SeedOptions {
            seed,
            sales: 50,
            days: 14,
            now: Utc.with_ymd_and_hms(2024, 5, 8, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_same_seed_same_snapshot() {
        let config = EngineConfig::default();
        let a = demo_snapshot(&options(7), &config).unwrap();
        let b = demo_snapshot(&options(7), &config).unwrap();
        assert_eq!(a, b);

        let c = demo_snapshot(&options(8), &config).unwrap();
        assert_ne!(a.sales, c.sales);
    }

    #[test]
    fn test_demo_snapshot_shape() {
        let snapshot = demo_snapshot(&options(42), &EngineConfig::default()).unwrap();

        assert_eq!(snapshot.staff.len(), 6);
        assert_eq!(snapshot.items.len(), 15);
        assert_eq!(snapshot.recipes.len(), 5);
        assert_eq!(snapshot.packages.len(), 5);
        assert_eq!(snapshot.sales.len(), 50);
        assert!(snapshot.validate().is_ok());

        let now = options(42).now;
        assert!(snapshot
            .sales
            .windows(2)
            .all(|pair| pair[0].datetime <= pair[1].datetime));
        assert!(snapshot
            .sales
            .iter()
            .all(|s| s.datetime < now && s.datetime >= now - Duration::days(14)));
        assert!(snapshot.sales.iter().all(|s| s.profit == s.total - s.cost));
    }

    #[test]
    fn test_demo_snapshot_feeds_reports() {
        let opts = options(3);
        let config = EngineConfig {
            utc_offset_minutes: Some(0),
            ..EngineConfig::default()
        };
        let snapshot = demo_snapshot(&opts, &config).unwrap();
        let engine = Engine::new(snapshot, config, FixedClock::new(opts.now)).unwrap();

        let month = engine.period_summary(ReportPeriod::Month);
        let total: i64 = engine
            .metrics(ReportPeriod::Month)
            .iter()
            .map(|m| m.revenue.cents())
            .sum();
        assert_eq!(month.revenue.cents(), total);
    }
}
