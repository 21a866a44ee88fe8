//! # Engine Configuration
//!
//! The few knobs the engine has. Passed explicitly; never read from globals.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_DEFAULT_MARKUP=2.0                                           │
//! │     TALLY_WEEK_START=sunday                                            │
//! │                                                                         │
//! │  2. TOML Config File (loaded by the host, see tally-report)            │
//! │     [engine] table of tally.toml                                       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     markup ×2.0, recipe ×2.5, Monday, top 10                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [engine]
//! default_markup = 2.0
//! recipe_markup = 2.5
//! week_start = "monday"
//! leaderboard_top_n = 10
//! recent_sales_limit = 10
//! utc_offset_minutes = -420   # omit to use the host time zone
//! ```

use std::str::FromStr;

use chrono::{FixedOffset, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::leaderboard::DEFAULT_TOP_N;
use crate::pricing::{PricingPolicy, DEFAULT_MARKUP, RECIPE_MARKUP};
use crate::types::Markup;

/// Environment variable names.
pub const ENV_DEFAULT_MARKUP: &str = "TALLY_DEFAULT_MARKUP";
pub const ENV_RECIPE_MARKUP: &str = "TALLY_RECIPE_MARKUP";
pub const ENV_WEEK_START: &str = "TALLY_WEEK_START";
pub const ENV_TOP_N: &str = "TALLY_TOP_N";
pub const ENV_RECENT_SALES: &str = "TALLY_RECENT_SALES";
pub const ENV_UTC_OFFSET: &str = "TALLY_UTC_OFFSET_MINUTES";

// =============================================================================
// Config Error
// =============================================================================

/// Invalid engine configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Applied to an item's buy price when it has no current sell price.
    #[serde(default = "default_markup")]
    pub default_markup: Markup,

    /// Applied to a recipe's calculated cost for its suggested price.
    #[serde(default = "default_recipe_markup")]
    pub recipe_markup: Markup,

    /// First day of the reporting week.
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,

    /// Leaderboard length.
    #[serde(default = "default_top_n")]
    pub leaderboard_top_n: usize,

    /// Number of recent sales on a staff profile.
    #[serde(default = "default_recent_sales_limit")]
    pub recent_sales_limit: usize,

    /// Fixed local offset from UTC in minutes. `None` uses the host zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_markup() -> Markup {
    Markup::new(DEFAULT_MARKUP)
}

fn default_recipe_markup() -> Markup {
    Markup::new(RECIPE_MARKUP)
}

fn default_week_start() -> Weekday {
    Weekday::Mon
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_recent_sales_limit() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_markup: default_markup(),
            recipe_markup: default_recipe_markup(),
            week_start: default_week_start(),
            leaderboard_top_n: default_top_n(),
            recent_sales_limit: default_recent_sales_limit(),
            utc_offset_minutes: None,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_markup.multiplier() <= Decimal::ZERO {
            return Err(ConfigError::invalid("default_markup", "must be greater than 0"));
        }

        if self.recipe_markup.multiplier() <= Decimal::ZERO {
            return Err(ConfigError::invalid("recipe_markup", "must be greater than 0"));
        }

        if self.leaderboard_top_n == 0 {
            return Err(ConfigError::invalid("leaderboard_top_n", "must be greater than 0"));
        }

        if let Some(minutes) = self.utc_offset_minutes {
            if self.fixed_offset().is_none() {
                return Err(ConfigError::invalid(
                    "utc_offset_minutes",
                    format!("{} is not a valid UTC offset", minutes),
                ));
            }
        }

        Ok(())
    }

    /// Applies overrides from `TALLY_*` variables.
    ///
    /// `lookup` resolves a variable name; the host passes `std::env::var`.
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(m) = parse_override::<Decimal, _>(&lookup, ENV_DEFAULT_MARKUP) {
            self.default_markup = Markup::new(m);
        }
        if let Some(m) = parse_override::<Decimal, _>(&lookup, ENV_RECIPE_MARKUP) {
            self.recipe_markup = Markup::new(m);
        }
        if let Some(day) = parse_override(&lookup, ENV_WEEK_START) {
            self.week_start = day;
        }
        if let Some(n) = parse_override(&lookup, ENV_TOP_N) {
            self.leaderboard_top_n = n;
        }
        if let Some(n) = parse_override(&lookup, ENV_RECENT_SALES) {
            self.recent_sales_limit = n;
        }
        if let Some(minutes) = parse_override(&lookup, ENV_UTC_OFFSET) {
            self.utc_offset_minutes = Some(minutes);
        }
    }

    /// The pricing markups.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            default_markup: self.default_markup,
            recipe_markup: self.recipe_markup,
        }
    }

    /// The configured fixed offset, if one is set and valid.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
    }
}

/// Reads and parses one override variable.
fn parse_override<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => {
            debug!(variable = name, value = %value.trim(), "Applying override from environment");
            Some(parsed)
        }
        Err(_) => {
            warn!(variable = name, value = %value, "Ignoring invalid override");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
