//! # tally-core: Commission & Sales Aggregation Engine
//!
//! Pure business logic behind the saloon dashboard: what things cost, what a
//! sale earned, what staff are owed and who is on top this week.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-report (binary)                           │   │
//! │  │   settings (TOML + env) ──► snapshot.json ──► JSON reports      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │   sale    │  │commission │  │leaderboard│  │   │
//! │  │   │ resolver  │  │ valuation │  │  rules    │  │  ranking  │  │   │
//! │  │   │  markups  │  │  totals   │  │  tiers    │  │  windows  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO WALL CLOCK (inject a Clock) • NO RANDOMNESS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Quantities, percentages, margins, staff
//! - [`catalog`] - Items, sell prices, recipes, packages
//! - [`pricing`] - Current sell price resolution
//! - [`sale`] - Line valuation and sale totals
//! - [`commission`] - Commission rules
//! - [`window`] - Today / week / month windows
//! - [`leaderboard`] - Per-staff aggregation and ranking
//! - [`report`] - Period summary and staff profile
//! - [`engine`] - Snapshot + config + clock
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::sale::{totalize_sale, SaleLine};
//! use tally_core::types::{Quantity, SourceKind};
//!
//! let whiskey = SaleLine {
//!     source_type: SourceKind::Item,
//!     source_id: "whiskey".into(),
//!     name: "Rattlesnake Whiskey".into(),
//!     quantity: Quantity::units(3),
//!     unit_price: Money::from_cents(350),
//!     unit_cost: Money::from_cents(125),
//! };
//!
//! let totals = totalize_sale(&[whiskey], Money::from_cents(50)).unwrap();
//! assert_eq!(totals.subtotal.cents(), 1050);
//! assert_eq!(totals.total.cents(), 1000);
//! assert_eq!(totals.profit.cents(), 625);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod clock;
pub mod commission;
pub mod config;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod money;
pub mod pricing;
pub mod report;
pub mod sale;
pub mod types;
pub mod validation;
pub mod window;

#[cfg(test)]
mod properties;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use commission::CommissionRule;
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, Snapshot};
pub use error::{CoreError, CoreResult, ValidationError};
pub use leaderboard::{Leaderboards, Metric, RankedEntry, StaffMetrics};
pub use money::Money;
pub use report::{PeriodSummary, StaffProfile};
pub use sale::{Sale, SaleDraft, SaleLine, SaleTotals};
pub use types::*;
pub use window::{ReportPeriod, ReportWindow};
