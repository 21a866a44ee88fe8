//! # Period Aggregation & Leaderboards
//!
//! Folds sales into per-staff metrics for a window and ranks staff by one
//! metric at a time.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales ──► filter [start, end) ──► group by staff ──► StaffMetrics     │
//! │                                                          │              │
//! │                 ┌────────────────────────────────────────┘              │
//! │                 ▼                                                       │
//! │  rank(metric):  metric value   DESC                                     │
//! │                 order count    DESC                                     │
//! │                 staff id       ASC      (total order: no ties survive)  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  top N (10) ──► RankedEntry { rank, staff, value, orderCount }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Weighted Margin
//! Average margin is `Σ profit / Σ subtotal × 100`, NOT the mean of
//! per-sale margins. A $10 sale at 90% and a $1000 sale at 10% average to
//! about 10.8%, not 50%.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::sale::Sale;
use crate::types::{Margin, StaffMember};
use crate::window::ReportWindow;

/// Default leaderboard length.
pub const DEFAULT_TOP_N: usize = 10;

// =============================================================================
// Staff Metrics
// =============================================================================

/// Sums of one staff member's sales over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffMetrics {
    pub staff_id: String,
    pub staff_name: String,
    /// Σ sale total.
    pub revenue: Money,
    pub profit: Money,
    pub commission: Money,
    pub subtotal: Money,
    pub cost: Money,
    pub order_count: usize,
    /// Σ profit / Σ subtotal × 100.
    pub avg_margin: Margin,
}

impl StaffMetrics {
    /// Empty metrics for a staff member.
    pub fn new(staff: &StaffMember) -> Self {
        StaffMetrics {
            staff_id: staff.id.clone(),
            staff_name: staff.name.clone(),
            revenue: Money::zero(),
            profit: Money::zero(),
            commission: Money::zero(),
            subtotal: Money::zero(),
            cost: Money::zero(),
            order_count: 0,
            avg_margin: Margin::zero(),
        }
    }

    /// Adds one sale.
    pub fn record(&mut self, sale: &Sale) {
        self.revenue += sale.total;
        self.profit += sale.profit;
        self.commission += sale.commission;
        self.subtotal += sale.subtotal;
        self.cost += sale.cost;
        self.order_count += 1;
        self.avg_margin = Margin::of(self.profit, self.subtotal);
    }

    /// Adds another partial result for the same staff member.
    pub fn merge(&mut self, other: &StaffMetrics) {
        self.revenue += other.revenue;
        self.profit += other.profit;
        self.commission += other.commission;
        self.subtotal += other.subtotal;
        self.cost += other.cost;
        self.order_count += other.order_count;
        self.avg_margin = Margin::of(self.profit, self.subtotal);
    }

    /// The value this staff member is ranked by for `metric`.
    pub fn value_of(&self, metric: Metric) -> MetricValue {
        match metric {
            Metric::Revenue => MetricValue::Money(self.revenue),
            Metric::Profit => MetricValue::Money(self.profit),
            Metric::Orders => MetricValue::Count(self.order_count),
            Metric::Margin => MetricValue::Percent(self.avg_margin),
            Metric::Commission => MetricValue::Money(self.commission),
        }
    }
}

/// Aggregates the sales inside `window` per staff member.
///
/// Returns one entry per staff member, in roster order, including members
/// with no sales and inactive members. Sales by staff not on the roster are
/// skipped.
pub fn aggregate(sales: &[Sale], staff: &[StaffMember], window: &ReportWindow) -> Vec<StaffMetrics> {
    let mut metrics: Vec<StaffMetrics> = staff.iter().map(StaffMetrics::new).collect();
    let index: HashMap<&str, usize> = staff
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    for sale in sales.iter().filter(|s| window.contains(s.datetime)) {
        if let Some(&i) = index.get(sale.staff_id.as_str()) {
            metrics[i].record(sale);
        }
    }

    metrics
}

/// Same result as [`aggregate`], with the sales split across the rayon pool.
///
/// The sales are cut into `partitions` chunks; each chunk is aggregated on
/// its own and the partial sums are merged per staff member.
pub fn aggregate_partitioned(
    sales: &[Sale],
    staff: &[StaffMember],
    window: &ReportWindow,
    partitions: usize,
) -> Vec<StaffMetrics> {
    let partitions = partitions.max(1);
    if partitions == 1 || sales.len() < 2 {
        return aggregate(sales, staff, window);
    }

    let chunk_size = sales.len().div_ceil(partitions);
    sales
        .par_chunks(chunk_size)
        .map(|chunk| aggregate(chunk, staff, window))
        .reduce(
            || staff.iter().map(StaffMetrics::new).collect(),
            |mut merged, partial| {
                for (total, part) in merged.iter_mut().zip(&partial) {
                    total.merge(part);
                }
                merged
            },
        )
}

// =============================================================================
// Metric
// =============================================================================

/// A leaderboard metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Revenue,
    Profit,
    Orders,
    Margin,
    Commission,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Revenue,
        Metric::Profit,
        Metric::Orders,
        Metric::Margin,
        Metric::Commission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::Profit => "profit",
            Metric::Orders => "orders",
            Metric::Margin => "margin",
            Metric::Commission => "commission",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "metric".to_string(),
                value: s.to_string(),
                allowed: Metric::ALL.iter().map(|m| m.to_string()).collect(),
            })
    }
}

/// The value a staff member is ranked by.
///
/// Within one leaderboard every value is the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integer cents.
    Money(Money),
    Count(usize),
    /// Percentage points.
    Percent(Margin),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Money(m) => write!(f, "{}", m),
            MetricValue::Count(c) => write!(f, "{}", c),
            MetricValue::Percent(p) => write!(f, "{}", p),
        }
    }
}

// =============================================================================
// Ranking
// =============================================================================

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// 1-based.
    pub rank: usize,
    pub staff_id: String,
    pub staff_name: String,
    pub value: MetricValue,
    pub order_count: usize,
}

fn compare(metric: Metric, a: &StaffMetrics, b: &StaffMetrics) -> Ordering {
    b.value_of(metric)
        .cmp(&a.value_of(metric))
        .then_with(|| b.order_count.cmp(&a.order_count))
        .then_with(|| a.staff_id.cmp(&b.staff_id))
}

/// Ranks staff by `metric` and keeps the first `top_n`.
pub fn rank(metrics: &[StaffMetrics], metric: Metric, top_n: usize) -> Vec<RankedEntry> {
    let mut sorted: Vec<&StaffMetrics> = metrics.iter().collect();
    sorted.sort_by(|a, b| compare(metric, a, b));

    sorted
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, m)| RankedEntry {
            rank: idx + 1,
            staff_id: m.staff_id.clone(),
            staff_name: m.staff_name.clone(),
            value: m.value_of(metric),
            order_count: m.order_count,
        })
        .collect()
}

/// All five leaderboards for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Leaderboards {
    pub revenue: Vec<RankedEntry>,
    pub profit: Vec<RankedEntry>,
    pub orders: Vec<RankedEntry>,
    pub margin: Vec<RankedEntry>,
    pub commission: Vec<RankedEntry>,
}

impl Leaderboards {
    /// The board for one metric.
    pub fn board(&self, metric: Metric) -> &[RankedEntry] {
        match metric {
            Metric::Revenue => &self.revenue,
            Metric::Profit => &self.profit,
            Metric::Orders => &self.orders,
            Metric::Margin => &self.margin,
            Metric::Commission => &self.commission,
        }
    }
}

/// Builds every leaderboard from one metric set.
pub fn leaderboards(metrics: &[StaffMetrics], top_n: usize) -> Leaderboards {
    Leaderboards {
        revenue: rank(metrics, Metric::Revenue, top_n),
        profit: rank(metrics, Metric::Profit, top_n),
        orders: rank(metrics, Metric::Orders, top_n),
        margin: rank(metrics, Metric::Margin, top_n),
        commission: rank(metrics, Metric::Commission, top_n),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::PaymentType;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    pub(crate) fn staff(id: &str) -> StaffMember {
        serde_json::from_value(serde_json::json!({ "id": id, "name": id.to_uppercase() }))
            .unwrap()
    }

    pub(crate) fn sale(
        id: &str,
        staff_id: &str,
        at: DateTime<Utc>,
        subtotal: i64,
        cost: i64,
    ) -> Sale {
        Sale {
            id: id.to_string(),
            datetime: at,
            staff_id: staff_id.to_string(),
            customer: None,
            lines: Vec::new(),
            discount: Money::zero(),
            subtotal: Money::from_cents(subtotal),
            total: Money::from_cents(subtotal),
            cost: Money::from_cents(cost),
            profit: Money::from_cents(subtotal - cost),
            commission: Money::from_cents((subtotal - cost) / 10),
            payment_type: PaymentType::Cash,
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
    }

    fn window() -> ReportWindow {
        ReportWindow::new(base(), base() + Duration::days(7))
    }

    #[test]
    fn test_aggregate_sums_and_filters() {
        let roster = vec![staff("ann"), staff("bob")];
        let sales = vec![
            sale("1", "ann", base(), 1000, 400),
            sale("2", "ann", base() + Duration::hours(5), 2000, 500),
            sale("3", "bob", base() - Duration::minutes(1), 9999, 0),
            sale("4", "ghost", base(), 5000, 0),
        ];

        let metrics = aggregate(&sales, &roster, &window());
        assert_eq!(metrics.len(), 2);

        let ann = &metrics[0];
        assert_eq!(ann.revenue.cents(), 3000);
        assert_eq!(ann.profit.cents(), 2100);
        assert_eq!(ann.order_count, 2);
        assert_eq!(ann.avg_margin.percent(), Decimal::from(70));

        let bob = &metrics[1];
        assert_eq!(bob.order_count, 0);
        assert_eq!(bob.avg_margin, Margin::zero());
    }

    #[test]
    fn test_weighted_margin_differs_from_mean() {
        let roster = vec![staff("ann")];
        // $10 at 90% and $1000 at 10%
        let sales = vec![
            sale("1", "ann", base(), 1000, 100),
            sale("2", "ann", base(), 100000, 90000),
        ];
        let metrics = aggregate(&sales, &roster, &window());

        let weighted = metrics[0].avg_margin.percent();
        let mean = (Decimal::from(90) + Decimal::from(10)) / Decimal::from(2);
        assert!(weighted < Decimal::from(11));
        assert_ne!(weighted, mean);
    }

    #[test]
    fn test_rank_tie_breakers() {
        let roster = vec![staff("cat"), staff("ann"), staff("bob")];
        let sales = vec![
            // ann and bob tie on revenue; bob has more orders
            sale("1", "ann", base(), 2000, 0),
            sale("2", "bob", base(), 1000, 0),
            sale("3", "bob", base(), 1000, 0),
            // cat has no sales; ties with nobody
        ];
        let metrics = aggregate(&sales, &roster, &window());
        let board = rank(&metrics, Metric::Revenue, 10);

        let order: Vec<&str> = board.iter().map(|e| e.staff_id.as_str()).collect();
        assert_eq!(order, vec!["bob", "ann", "cat"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn test_rank_id_tie_break_and_top_n() {
        let roster = vec![staff("dan"), staff("ann"), staff("cat"), staff("bob")];
        let metrics = aggregate(&[], &roster, &window());

        let board = rank(&metrics, Metric::Profit, 2);
        let order: Vec<&str> = board.iter().map(|e| e.staff_id.as_str()).collect();
        assert_eq!(order, vec!["ann", "bob"]);
    }

    #[test]
    fn test_leaderboards_use_each_metric() {
        let roster = vec![staff("ann"), staff("bob")];
        let sales = vec![
            sale("1", "ann", base(), 10000, 9000),
            sale("2", "bob", base(), 2000, 200),
            sale("3", "bob", base(), 2000, 200),
        ];
        let metrics = aggregate(&sales, &roster, &window());
        let boards = leaderboards(&metrics, DEFAULT_TOP_N);

        assert_eq!(boards.board(Metric::Revenue)[0].staff_id, "ann");
        assert_eq!(boards.board(Metric::Orders)[0].staff_id, "bob");
        assert_eq!(boards.board(Metric::Margin)[0].staff_id, "bob");
        assert_eq!(boards.board(Metric::Profit)[0].staff_id, "bob");
        assert_eq!(boards.commission[0].value, MetricValue::Money(Money::from_cents(360)));
    }

    #[test]
    fn test_partitioned_matches_sequential() {
        let roster = vec![staff("ann"), staff("bob"), staff("cat")];
        let ids = ["ann", "bob", "cat"];
        let sales: Vec<Sale> = (0..50)
            .map(|i| {
                sale(
                    &i.to_string(),
                    ids[i % 3],
                    base() + Duration::hours(i as i64 * 5),
                    1000 + i as i64 * 37,
                    300 + i as i64 * 11,
                )
            })
            .collect();

        let sequential = aggregate(&sales, &roster, &window());
        for partitions in [1, 2, 3, 7, 64] {
            assert_eq!(aggregate_partitioned(&sales, &roster, &window(), partitions), sequential);
        }
    }

    #[test]
    fn test_partitioned_skips_unknown_staff() {
        let roster = vec![staff("ann"), staff("bob")];
        let sales = vec![
            sale("1", "ann", base() + Duration::hours(1), 1000, 400),
            sale("2", "ghost", base() + Duration::hours(2), 9000, 100),
            sale("3", "bob", base() + Duration::hours(3), 500, 100),
            sale("4", "ann", base() - Duration::hours(1), 700, 100),
        ];

        let merged = aggregate_partitioned(&sales, &roster, &window(), 0);
        assert_eq!(merged, aggregate(&sales, &roster, &window()));

        let merged = aggregate_partitioned(&sales, &roster, &window(), 4);
        let ids: Vec<&str> = merged.iter().map(|m| m.staff_id.as_str()).collect();
        assert_eq!(ids, vec!["ann", "bob"]);
        assert_eq!(merged[0].revenue, Money::from_cents(1000));
        assert_eq!(merged[0].order_count, 1);
        assert_eq!(merged[1].profit, Money::from_cents(400));
    }

    #[test]
    fn test_metric_parse_and_wire() {
        assert_eq!("Margin".parse::<Metric>().unwrap(), Metric::Margin);
        assert!("tips".parse::<Metric>().is_err());

        let entry = RankedEntry {
            rank: 1,
            staff_id: "ann".to_string(),
            staff_name: "ANN".to_string(),
            value: MetricValue::Money(Money::from_cents(2500)),
            order_count: 3,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["value"], 2500);
        assert_eq!(json["orderCount"], 3);
    }
}
