//! Property tests for the arithmetic and ranking laws.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::commission::{RuleKind, Tier, TierReward, TierSchedule};
use crate::leaderboard::{aggregate, aggregate_partitioned, rank, Metric};
use crate::money::Money;
use crate::sale::{totalize_sale, valuate_line, Sale, SaleLine};
use crate::types::{Margin, PaymentType, Percentage, Quantity, SourceKind, StaffMember};
use crate::window::ReportWindow;

fn arb_line() -> impl Strategy<Value = SaleLine> {
    // quantity in hundredths: 0.01 .. 50.00
    (1i64..5_000, 0i64..100_000, 0i64..100_000).prop_map(|(qty, price, cost)| SaleLine {
        source_type: SourceKind::Item,
        source_id: "item".to_string(),
        name: "Item".to_string(),
        quantity: Quantity::new(Decimal::new(qty, 2)),
        unit_price: Money::from_cents(price),
        unit_cost: Money::from_cents(cost),
    })
}

fn arb_tier() -> impl Strategy<Value = Tier> {
    (-10_000i64..100_000, any::<bool>(), 0u8..=100).prop_map(|(threshold, pct, value)| Tier {
        threshold: Money::from_cents(threshold),
        reward: if pct {
            TierReward::Percentage(Percentage::whole(value))
        } else {
            TierReward::Flat(Money::from_cents(i64::from(value) * 100))
        },
    })
}

fn arb_sales(staff: usize) -> impl Strategy<Value = Vec<Sale>> {
    prop::collection::vec((0..staff, 0i64..240, 0i64..50_000, 0i64..50_000), 0..60).prop_map(
        |rows| {
            let base = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
            rows.into_iter()
                .enumerate()
                .map(|(i, (who, hours, subtotal, cost))| Sale {
                    id: format!("s{}", i),
                    datetime: base + Duration::hours(hours),
                    staff_id: format!("staff-{}", who),
                    customer: None,
                    lines: Vec::new(),
                    discount: Money::zero(),
                    subtotal: Money::from_cents(subtotal),
                    total: Money::from_cents(subtotal),
                    cost: Money::from_cents(cost),
                    profit: Money::from_cents(subtotal - cost),
                    commission: Money::from_cents((subtotal - cost) / 20),
                    payment_type: PaymentType::Cash,
                })
                .collect()
        },
    )
}

fn roster(n: usize) -> Vec<StaffMember> {
    (0..n)
        .map(|i| StaffMember {
            id: format!("staff-{}", i),
            name: format!("Staff {}", i),
            role: Default::default(),
            status: Default::default(),
            commission_rule_id: None,
        })
        .collect()
}

fn week() -> ReportWindow {
    let start = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
    ReportWindow::new(start, start + Duration::days(7))
}

proptest! {
    #[test]
    fn totals_are_exact_sums(lines in prop::collection::vec(arb_line(), 0..12), discount in 0i64..500_000) {
        let totals = totalize_sale(&lines, Money::from_cents(discount)).unwrap();

        let (sum_total, sum_cost) = lines.iter().fold((Money::zero(), Money::zero()), |(t, c), line| {
            let v = valuate_line(line).unwrap();
            (t + v.line_total, c + v.line_cost)
        });

        prop_assert_eq!(totals.subtotal, sum_total);
        prop_assert_eq!(totals.cost, sum_cost);
        prop_assert_eq!(totals.profit, totals.total - totals.cost);
        prop_assert!(!totals.total.is_negative());
        if totals.discount >= totals.subtotal {
            prop_assert_eq!(totals.total, Money::zero());
        }
        if totals.subtotal.is_zero() {
            prop_assert_eq!(totals.margin, Margin::zero());
        }
    }

    #[test]
    fn tier_order_is_irrelevant_for_distinct_thresholds(
        mut tiers in prop::collection::vec(arb_tier(), 0..6),
        profit in -20_000i64..200_000,
    ) {
        tiers.sort_by_key(|t| t.threshold);
        tiers.dedup_by_key(|t| t.threshold);

        let forward = RuleKind::Tiered { schedule: TierSchedule::new(tiers.clone()) };
        tiers.reverse();
        let backward = RuleKind::Tiered { schedule: TierSchedule::new(tiers) };

        let profit = Money::from_cents(profit);
        prop_assert_eq!(forward.commission_on(profit, true), backward.commission_on(profit, true));
    }

    #[test]
    fn ranking_is_a_total_order(sales in arb_sales(6)) {
        let staff = roster(6);
        let metrics = aggregate(&sales, &staff, &week());

        for metric in Metric::ALL {
            let board = rank(&metrics, metric, usize::MAX);
            prop_assert_eq!(board.len(), staff.len());

            for pair in board.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                let ordered = a.value > b.value
                    || (a.value == b.value && a.order_count > b.order_count)
                    || (a.value == b.value && a.order_count == b.order_count && a.staff_id < b.staff_id);
                prop_assert!(ordered);
            }
        }
    }

    #[test]
    fn partitioned_aggregation_matches_sequential(sales in arb_sales(4), partitions in 1usize..9) {
        let staff = roster(4);
        prop_assert_eq!(
            aggregate_partitioned(&sales, &staff, &week(), partitions),
            aggregate(&sales, &staff, &week())
        );
    }
}
