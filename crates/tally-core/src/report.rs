//! # Dashboard Reports
//!
//! Period totals across all staff and the per-staff profile view.

use rust_decimal::Decimal;
use serde::Serialize;
use ts_rs::TS;

use crate::leaderboard::StaffMetrics;
use crate::money::Money;
use crate::sale::Sale;
use crate::types::{Margin, StaffMember};
use crate::window::ReportWindow;

// =============================================================================
// Period Summary
// =============================================================================

/// Footer totals of a window, across every staff member.
///
/// Built from the full metric set, never from a truncated leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub window: ReportWindow,
    pub revenue: Money,
    pub subtotal: Money,
    pub cost: Money,
    pub profit: Money,
    pub commission: Money,
    pub order_count: usize,
    /// Σ profit / Σ subtotal × 100 over all staff.
    pub avg_margin: Margin,
    /// Staff with at least one sale in the window.
    pub selling_staff: usize,
}

impl PeriodSummary {
    pub fn from_metrics(window: ReportWindow, metrics: &[StaffMetrics]) -> Self {
        let mut summary = PeriodSummary {
            window,
            revenue: Money::zero(),
            subtotal: Money::zero(),
            cost: Money::zero(),
            profit: Money::zero(),
            commission: Money::zero(),
            order_count: 0,
            avg_margin: Margin::zero(),
            selling_staff: 0,
        };

        for m in metrics {
            summary.revenue += m.revenue;
            summary.subtotal += m.subtotal;
            summary.cost += m.cost;
            summary.profit += m.profit;
            summary.commission += m.commission;
            summary.order_count += m.order_count;
            if m.order_count > 0 {
                summary.selling_staff += 1;
            }
        }
        summary.avg_margin = Margin::of(summary.profit, summary.subtotal);
        summary
    }
}

// =============================================================================
// Staff Profile
// =============================================================================

/// Counters for one staff member over one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub order_count: usize,
    pub revenue: Money,
    pub profit: Money,
    pub commission: Money,
    /// revenue / orders, or 0 without orders.
    pub avg_order_value: Money,
}

impl ProfileStats {
    fn collect<'a>(sales: impl Iterator<Item = &'a Sale>) -> Self {
        let mut stats = ProfileStats::default();
        for sale in sales {
            stats.order_count += 1;
            stats.revenue += sale.total;
            stats.profit += sale.profit;
            stats.commission += sale.commission;
        }
        if stats.order_count > 0 {
            stats.avg_order_value = Money::from_decimal_cents(
                stats.revenue.as_decimal_cents() / Decimal::from(stats.order_count),
            );
        }
        stats
    }
}

/// Everything the staff profile page shows.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub staff: StaffMember,
    pub lifetime: ProfileStats,
    pub this_week: ProfileStats,
    /// Newest first.
    pub recent_sales: Vec<Sale>,
}

/// Builds a staff member's profile.
///
/// `lifetime` bounds the history considered at all (normally everything
/// before now); `week` is the current week window.
pub fn staff_profile(
    staff: &StaffMember,
    sales: &[Sale],
    lifetime: &ReportWindow,
    week: &ReportWindow,
    recent_limit: usize,
) -> StaffProfile {
    let mut own: Vec<&Sale> = sales
        .iter()
        .filter(|s| s.staff_id == staff.id && lifetime.contains(s.datetime))
        .collect();

    let lifetime_stats = ProfileStats::collect(own.iter().copied());
    let week_stats = ProfileStats::collect(own.iter().copied().filter(|s| week.contains(s.datetime)));

    own.sort_by(|a, b| b.datetime.cmp(&a.datetime).then_with(|| a.id.cmp(&b.id)));

    StaffProfile {
        staff: staff.clone(),
        lifetime: lifetime_stats,
        this_week: week_stats,
        recent_sales: own.into_iter().take(recent_limit).cloned().collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::aggregate;
    use crate::leaderboard::tests::{sale, staff};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_totals_all_staff() {
        let roster = vec![staff("ann"), staff("bob"), staff("cat")];
        let sales = vec![
            sale("1", "ann", monday(), 1000, 400),
            sale("2", "bob", monday(), 3000, 1000),
        ];
        let window = ReportWindow::new(monday(), monday() + Duration::days(1));
        let metrics = aggregate(&sales, &roster, &window);

        let summary = PeriodSummary::from_metrics(window, &metrics);
        assert_eq!(summary.revenue.cents(), 4000);
        assert_eq!(summary.profit.cents(), 2600);
        assert_eq!(summary.cost.cents(), 1400);
        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.selling_staff, 2);
        assert_eq!(summary.avg_margin, Margin::of(Money::from_cents(2600), Money::from_cents(4000)));
    }

    #[test]
    fn test_summary_empty_window() {
        let window = ReportWindow::new(monday(), monday());
        let summary = PeriodSummary::from_metrics(window, &[]);
        assert_eq!(summary.revenue, Money::zero());
        assert_eq!(summary.avg_margin, Margin::zero());
    }

    #[test]
    fn test_staff_profile() {
        let ann = staff("ann");
        let sales = vec![
            sale("a", "ann", monday() - Duration::days(3), 1000, 500),
            sale("c", "ann", monday() + Duration::hours(2), 2000, 500),
            sale("b", "ann", monday() + Duration::hours(2), 3000, 500),
            sale("x", "bob", monday() + Duration::hours(3), 9000, 500),
        ];
        let now = monday() + Duration::days(1);
        let lifetime = ReportWindow::until(now);
        let week = ReportWindow::new(monday(), now);

        let profile = staff_profile(&ann, &sales, &lifetime, &week, 2);

        assert_eq!(profile.lifetime.order_count, 3);
        assert_eq!(profile.lifetime.revenue.cents(), 6000);
        assert_eq!(profile.lifetime.avg_order_value.cents(), 2000);
        assert_eq!(profile.this_week.order_count, 2);
        assert_eq!(profile.this_week.revenue.cents(), 5000);

        let recent: Vec<&str> = profile.recent_sales.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(recent, vec!["b", "c"]);
    }

    #[test]
    fn test_staff_profile_without_sales() {
        let profile = staff_profile(
            &staff("cat"),
            &[],
            &ReportWindow::until(monday()),
            &ReportWindow::new(monday(), monday()),
            5,
        );
        assert_eq!(profile.lifetime, ProfileStats::default());
        assert!(profile.recent_sales.is_empty());
    }
}
