//! # Engine
//!
//! Binds one consistent `Snapshot` to a configuration and a clock, and
//! answers every dashboard question from it.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(draft)                                                     │
//! │    │                                                                    │
//! │    ├── staff lookup ─────────── StaffNotFound                           │
//! │    ├── totalize_sale(lines) ─── ValidationError                         │
//! │    ├── rule lookup ──────────── None → commission 0                     │
//! │    │                            dangling id → CommissionRuleNotFound    │
//! │    ├── rule.evaluate(totals)                                            │
//! │    └── append Sale to history                                           │
//! │                                                                         │
//! │  leaderboards(period)                                                   │
//! │    │                                                                    │
//! │    ├── window(period)  ◄── clock.now() read ONCE                        │
//! │    ├── aggregate(sales, staff, window)                                  │
//! │    └── rank × 5 metrics, top N                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::catalog::{Catalog, CatalogItem, Package, Recipe};
use crate::clock::{Clock, SystemClock};
use crate::commission::{commission_for, CommissionRule};
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::leaderboard::{self, Leaderboards, StaffMetrics};
use crate::money::Money;
use crate::pricing::{self, PriceOrigin, RecipePricing, ResolvedPrice};
use crate::report::{self, PeriodSummary, StaffProfile};
use crate::sale::{totalize_sale, Sale, SaleDraft, SaleLine, SaleTotals};
use crate::types::{Quantity, SourceKind, StaffMember};
use crate::validation;
use crate::window::{window_for, ReportPeriod, ReportWindow};

// =============================================================================
// Snapshot
// =============================================================================

/// Everything the engine reads, as one consistent set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub commission_rules: Vec<CommissionRule>,
    #[serde(default)]
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl Snapshot {
    /// Catalog view over this snapshot.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.items, &self.recipes, &self.packages)
    }

    /// Finds a staff member.
    pub fn staff_member(&self, id: &str) -> CoreResult<&StaffMember> {
        self.staff
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::StaffNotFound(id.to_string()))
    }

    /// The commission rule assigned to a staff member.
    ///
    /// `Ok(None)` when no rule is assigned. A rule id that matches no rule
    /// is an error.
    pub fn rule_for(&self, staff: &StaffMember) -> CoreResult<Option<&CommissionRule>> {
        let Some(rule_id) = staff.commission_rule_id.as_deref() else {
            return Ok(None);
        };
        self.commission_rules
            .iter()
            .find(|r| r.id == rule_id)
            .map(Some)
            .ok_or_else(|| CoreError::CommissionRuleNotFound {
                staff_id: staff.id.clone(),
                rule_id: rule_id.to_string(),
            })
    }

    /// Checks every entity and every cross-reference.
    ///
    /// Ids are unique within each collection. Stored sales must reconcile
    /// with their own figures.
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_unique_ids("item.id", self.items.iter().map(|i| i.id.as_str()))?;
        validation::validate_unique_ids("recipe.id", self.recipes.iter().map(|r| r.id.as_str()))?;
        validation::validate_unique_ids("package.id", self.packages.iter().map(|p| p.id.as_str()))?;
        validation::validate_unique_ids(
            "commissionRule.id",
            self.commission_rules.iter().map(|r| r.id.as_str()),
        )?;
        validation::validate_unique_ids("staff.id", self.staff.iter().map(|s| s.id.as_str()))?;
        validation::validate_unique_ids("sale.id", self.sales.iter().map(|s| s.id.as_str()))?;

        for item in &self.items {
            validation::validate_catalog_item(item)?;
        }
        for recipe in &self.recipes {
            validation::validate_recipe(recipe)?;
        }
        for package in &self.packages {
            validation::validate_package(package)?;
        }
        for staff in &self.staff {
            validation::validate_staff(staff)?;
            self.rule_for(staff)?;
        }

        let catalog = self.catalog();
        for recipe in &self.recipes {
            catalog.recipe_cost(recipe)?;
        }
        for package in &self.packages {
            catalog.package_cost(package)?;
        }

        for sale in &self.sales {
            validation::validate_sale_record(sale)?;
            self.staff_member(&sale.staff_id)?;
        }

        Ok(())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The commission and sales aggregation engine.
pub struct Engine<C: Clock = SystemClock> {
    snapshot: Snapshot,
    config: EngineConfig,
    clock: C,
}

impl Engine<SystemClock> {
    /// Creates an engine on the system clock.
    pub fn with_system_clock(snapshot: Snapshot, config: EngineConfig) -> CoreResult<Self> {
        Engine::new(snapshot, config, SystemClock)
    }
}

impl<C: Clock> Engine<C> {
    /// Creates an engine after validating the configuration and the snapshot.
    pub fn new(snapshot: Snapshot, config: EngineConfig, clock: C) -> CoreResult<Self> {
        config.validate()?;
        snapshot.validate()?;

        debug!(
            items = snapshot.items.len(),
            recipes = snapshot.recipes.len(),
            packages = snapshot.packages.len(),
            staff = snapshot.staff.len(),
            sales = snapshot.sales.len(),
            "Engine loaded snapshot"
        );

        Ok(Engine {
            snapshot,
            config,
            clock,
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the engine, returning the snapshot with any recorded sales.
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Current sell price of an item.
    pub fn price_of_item(&self, item_id: &str, unit: Option<&str>) -> CoreResult<Money> {
        let item = self.snapshot.catalog().item(item_id)?;
        Ok(pricing::resolve_sell_price(
            item,
            unit,
            self.clock.now(),
            &self.config.pricing_policy(),
        ))
    }

    /// Current sell price of any catalog source, with its origin.
    pub fn price_source(&self, kind: SourceKind, id: &str) -> CoreResult<ResolvedPrice> {
        let catalog = self.snapshot.catalog();
        let policy = self.config.pricing_policy();

        let resolved = match kind {
            SourceKind::Item => {
                pricing::quote_item(catalog.item(id)?, None, self.clock.now(), &policy)
            }
            SourceKind::Recipe => ResolvedPrice {
                price: pricing::resolve_recipe_price(catalog.recipe(id)?, &catalog, &policy)?,
                origin: PriceOrigin::RecipeMarkup,
            },
            SourceKind::Package => ResolvedPrice {
                price: pricing::resolve_package_price(catalog.package(id)?),
                origin: PriceOrigin::Bundle,
            },
        };

        trace!(%kind, id, price = %resolved.price, "Resolved price");
        Ok(resolved)
    }

    /// Cost, suggested price and suggested margin of a recipe.
    pub fn recipe_pricing(&self, recipe_id: &str) -> CoreResult<RecipePricing> {
        let catalog = self.snapshot.catalog();
        pricing::price_recipe(catalog.recipe(recipe_id)?, &catalog, &self.config.pricing_policy())
    }

    /// Builds a sale line priced and costed from the catalog right now.
    pub fn quote_line(
        &self,
        kind: SourceKind,
        id: &str,
        quantity: Quantity,
        unit: Option<&str>,
    ) -> CoreResult<SaleLine> {
        let catalog = self.snapshot.catalog();
        let (name, unit_price) = match kind {
            SourceKind::Item => {
                let item = catalog.item(id)?;
                let price = pricing::resolve_sell_price(
                    item,
                    unit,
                    self.clock.now(),
                    &self.config.pricing_policy(),
                );
                (item.name.clone(), price)
            }
            SourceKind::Recipe => (catalog.recipe(id)?.name.clone(), self.price_source(kind, id)?.price),
            SourceKind::Package => (catalog.package(id)?.name.clone(), self.price_source(kind, id)?.price),
        };

        Ok(SaleLine {
            source_type: kind,
            source_id: id.to_string(),
            name,
            quantity,
            unit_price,
            unit_cost: catalog.unit_cost(kind, id)?,
        })
    }

    // =========================================================================
    // Sales & Commission
    // =========================================================================

    /// Commission a staff member earns on a totalled sale.
    pub fn commission_for_staff(&self, staff_id: &str, totals: &SaleTotals) -> CoreResult<Money> {
        let staff = self.snapshot.staff_member(staff_id)?;
        let rule = self.snapshot.rule_for(staff)?;
        Ok(commission_for(rule, totals))
    }

    /// Values, totals and commissions a sale, then appends it to the history.
    ///
    /// Nothing is appended when any step fails. A draft whose id is already
    /// in the history is rejected.
    pub fn record_sale(&mut self, draft: SaleDraft) -> CoreResult<Sale> {
        validation::validate_id("sale.id", &draft.id)?;
        if self.snapshot.sales.iter().any(|s| s.id == draft.id) {
            return Err(ValidationError::Duplicate {
                field: "sale.id".to_string(),
                value: draft.id,
            }
            .into());
        }
        let totals = totalize_sale(&draft.lines, draft.discount)?;
        let commission = self.commission_for_staff(&draft.staff_id, &totals)?;

        let sale = Sale::from_draft(draft, &totals, commission);
        info!(
            sale_id = %sale.id,
            staff_id = %sale.staff_id,
            total = %sale.total,
            profit = %sale.profit,
            commission = %sale.commission,
            "Sale recorded"
        );

        self.snapshot.sales.push(sale.clone());
        Ok(sale)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// The window of `period` ending now, in the configured local zone.
    pub fn window(&self, period: ReportPeriod) -> ReportWindow {
        self.window_at(period, self.clock.now())
    }

    fn window_at(&self, period: ReportPeriod, now: DateTime<Utc>) -> ReportWindow {
        let window = match self.config.fixed_offset() {
            Some(offset) => window_for(period, now, &offset, self.config.week_start),
            None => window_for(period, now, &Local, self.config.week_start),
        };
        debug!(%period, start = %window.start, end = %window.end, "Computed report window");
        window
    }

    /// Per-staff metrics for `period`, every staff member included.
    pub fn metrics(&self, period: ReportPeriod) -> Vec<StaffMetrics> {
        let window = self.window(period);
        self.metrics_in(&window)
    }

    /// Per-staff metrics for an explicit window.
    pub fn metrics_in(&self, window: &ReportWindow) -> Vec<StaffMetrics> {
        let metrics = leaderboard::aggregate(&self.snapshot.sales, &self.snapshot.staff, window);
        debug!(
            sales = self.snapshot.sales.len(),
            staff = metrics.len(),
            "Aggregated sales"
        );
        metrics
    }

    /// Per-staff metrics for `period`, aggregated in `partitions` parallel chunks.
    pub fn metrics_partitioned(&self, period: ReportPeriod, partitions: usize) -> Vec<StaffMetrics> {
        let window = self.window(period);
        debug!(partitions, "Aggregating sales in partitions");
        leaderboard::aggregate_partitioned(
            &self.snapshot.sales,
            &self.snapshot.staff,
            &window,
            partitions,
        )
    }

    /// All five leaderboards for `period`.
    pub fn leaderboards(&self, period: ReportPeriod) -> Leaderboards {
        leaderboard::leaderboards(&self.metrics(period), self.config.leaderboard_top_n)
    }

    /// Totals across all staff for `period`.
    pub fn period_summary(&self, period: ReportPeriod) -> PeriodSummary {
        let window = self.window(period);
        PeriodSummary::from_metrics(window, &self.metrics_in(&window))
    }

    /// A staff member's lifetime and this-week figures and recent sales.
    pub fn staff_profile(&self, staff_id: &str) -> CoreResult<StaffProfile> {
        let staff = self.snapshot.staff_member(staff_id)?;
        let now = self.clock.now();
        let week = self.window_at(ReportPeriod::Week, now);

        Ok(report::staff_profile(
            staff,
            &self.snapshot.sales,
            &ReportWindow::until(now),
            &week,
            self.config.recent_sales_limit,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
