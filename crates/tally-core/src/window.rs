//! # Report Windows
//!
//! Turns a named period into a concrete, half-open time range.
//!
//! Every window is `[start, now)`:
//! - `TODAY` starts at local midnight
//! - `WEEK` starts at midnight of the most recent week-start day (Monday)
//! - `MONTH` starts at midnight on the 1st
//!
//! "Local" is whatever `TimeZone` the caller passes: the host zone
//! (`chrono::Local`) or a configured fixed offset.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Report Period
// =============================================================================

/// A named reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Today,
    Week,
    Month,
}

impl ReportPeriod {
    pub const ALL: [ReportPeriod; 3] = [ReportPeriod::Today, ReportPeriod::Week, ReportPeriod::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(ReportPeriod::Today),
            "week" => Ok(ReportPeriod::Week),
            "month" => Ok(ReportPeriod::Month),
            other => Err(ValidationError::NotAllowed {
                field: "period".to_string(),
                value: other.to_string(),
                allowed: ReportPeriod::ALL.iter().map(|p| p.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Report Window
// =============================================================================

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportWindow {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ReportWindow { start, end }
    }

    /// Everything before `end`.
    pub fn until(end: DateTime<Utc>) -> Self {
        ReportWindow {
            start: DateTime::<Utc>::MIN_UTC,
            end,
        }
    }

    /// Checks `start <= at < end`.
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Computes the window of `period` ending at `now`, in time zone `tz`.
pub fn window_for<Tz: TimeZone>(
    period: ReportPeriod,
    now: DateTime<Utc>,
    tz: &Tz,
    week_start: Weekday,
) -> ReportWindow {
    let today = now.with_timezone(tz).date_naive();

    let start_day = match period {
        ReportPeriod::Today => today,
        ReportPeriod::Week => {
            let back = (7 + today.weekday().num_days_from_monday()
                - week_start.num_days_from_monday())
                % 7;
            today - Duration::days(i64::from(back))
        }
        ReportPeriod::Month => today.with_day(1).unwrap_or(today),
    };

    ReportWindow::new(local_midnight(start_day, tz), now)
}

/// The first instant of `day` in `tz`, as UTC.
///
/// Where midnight is repeated (clocks fall back) the earlier instant is
/// used. Where midnight does not exist (clocks spring forward) the first
/// existing minute after it is used.
pub fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    let mut candidate = midnight;
    while candidate < midnight + Duration::days(1) {
        if let Some(at) = tz.from_local_datetime(&candidate).earliest() {
            return at.with_timezone(&Utc);
        }
        candidate += Duration::minutes(1);
    }
    // No zone skips a whole day at midnight; fall back to reading as UTC.
    Utc.from_utc_datetime(&midnight)
}

// =============================================================================
// Unit Tests
// =============================================================================
