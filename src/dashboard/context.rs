use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::bucket::Granularity;
use super::format::QuotaDisplay;

/// Minimum number of x-axis buckets the console charts show.
pub const MAX_TREND_POINTS: usize = 7;

/// Quota units per display currency unit ($1 = 500 000 quota).
pub const DEFAULT_QUOTA_PER_UNIT: f64 = 500_000.0;

/// Query window the records were fetched for (Unix seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub start: i64,
    pub end: i64,
}

impl QueryWindow {
    /// Window the console opens with: from one lookback period ago until
    /// an hour past `now`.
    pub fn default_for(granularity: Granularity, now: i64) -> Self {
        Self {
            start: now - granularity.default_lookback_secs(),
            end: now + 3600,
        }
    }

    /// Fill whichever bound is missing from the default window.
    pub fn resolve(start: Option<i64>, end: Option<i64>, granularity: Granularity, now: i64) -> Self {
        let fallback = Self::default_for(granularity, now);
        Self {
            start: start.unwrap_or(fallback.start),
            end: end.unwrap_or(fallback.end),
        }
    }
}

/// Everything a pipeline run depends on besides the records themselves.
///
/// Built fresh per run; nothing here is shared between runs.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub granularity: Granularity,
    /// Offset used as "local time" when keying buckets.
    pub offset: FixedOffset,
    pub quota_per_unit: f64,
    pub display: QuotaDisplay,
    /// Axis is extended backward until it has at least this many buckets.
    /// 0 disables the extension.
    pub min_chart_points: usize,
    /// Prefix of every chart subtitle.
    pub total_label: String,
    pub window: Option<QueryWindow>,
}

impl Default for DashboardContext {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            offset: Utc.fix(),
            quota_per_unit: DEFAULT_QUOTA_PER_UNIT,
            display: QuotaDisplay::default(),
            min_chart_points: MAX_TREND_POINTS,
            total_label: "Total".to_string(),
            window: None,
        }
    }
}

impl DashboardContext {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_display(mut self, display: QuotaDisplay, quota_per_unit: f64) -> Self {
        self.display = display;
        self.quota_per_unit = quota_per_unit;
        self
    }

    pub fn with_min_chart_points(mut self, points: usize) -> Self {
        self.min_chart_points = points;
        self
    }

    pub fn with_window(mut self, window: Option<QueryWindow>) -> Self {
        self.window = window;
        self
    }

    /// `"Total: <value>"` subtitle.
    pub fn subtitle(&self, value: &str) -> String {
        format!("{}: {}", self.total_label, value)
    }
}
