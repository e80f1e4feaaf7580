//! Time bucketing: turns a record timestamp into the string key used as
//! map key and chart x-axis category.
//!
//! Keys zero-pad every component so that lexicographic order equals
//! chronological order within a single year. Hour, day and week keys carry
//! no year, so data spanning a year boundary sorts December after January.
//! That is a known limitation of the key format.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Months, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_DAY: i64 = 86_400;

/// Bucket size selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Parse a selector. Unknown values fall back to `Day`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Granularity::Hour,
            "week" => Granularity::Week,
            "month" => Granularity::Month,
            _ => Granularity::Day,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }

    /// Nominal bucket length in minutes (months count as 30 days).
    pub fn interval_minutes(&self) -> u64 {
        match self {
            Granularity::Hour => 60,
            Granularity::Day => 1_440,
            Granularity::Week => 10_080,
            Granularity::Month => 43_200,
        }
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval_minutes() as i64 * SECS_PER_MINUTE
    }

    /// How far back the console looks by default for this granularity.
    pub fn default_lookback_secs(&self) -> i64 {
        match self {
            Granularity::Hour => SECS_PER_DAY,
            Granularity::Week => 30 * SECS_PER_DAY,
            _ => 7 * SECS_PER_DAY,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Granularity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Granularity::parse(&raw))
    }
}

/// Timestamp in the dashboard's local offset. Out-of-range timestamps
/// collapse to the epoch instead of failing.
pub fn local_datetime(timestamp: i64, offset: &FixedOffset) -> DateTime<FixedOffset> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_default()
        .with_timezone(offset)
}

/// Bucket key for `timestamp`:
///
/// | granularity | key               |
/// |-------------|-------------------|
/// | hour        | `MM-DD HH:00`     |
/// | day         | `MM-DD`           |
/// | week        | `MM-DD - MM-DD`   |
/// | month       | `YYYY-MM`         |
///
/// The week key starts at the record's own local day and ends six days
/// later. It is not aligned to a calendar week, so records on different
/// days get different week keys.
pub fn bucket_key(timestamp: i64, granularity: Granularity, offset: &FixedOffset) -> String {
    let dt = local_datetime(timestamp, offset);
    match granularity {
        Granularity::Hour => format!("{:02}-{:02} {:02}:00", dt.month(), dt.day(), dt.hour()),
        Granularity::Day => format!("{:02}-{:02}", dt.month(), dt.day()),
        Granularity::Week => {
            let end = local_datetime(timestamp.saturating_add(6 * SECS_PER_DAY), offset);
            format!(
                "{:02}-{:02} - {:02}-{:02}",
                dt.month(),
                dt.day(),
                end.month(),
                end.day()
            )
        }
        Granularity::Month => format!("{:04}-{:02}", dt.year(), dt.month()),
    }
}

/// Timestamp one bucket after `timestamp`. Months step by calendar month.
pub fn next_bucket(timestamp: i64, granularity: Granularity, offset: &FixedOffset) -> i64 {
    if granularity == Granularity::Month {
        if let Some(next) = local_datetime(timestamp, offset).checked_add_months(Months::new(1)) {
            return next.timestamp();
        }
    }
    timestamp.saturating_add(granularity.interval_secs())
}

/// Timestamp one bucket before `timestamp`. Months step by calendar month.
pub fn prev_bucket(timestamp: i64, granularity: Granularity, offset: &FixedOffset) -> i64 {
    if granularity == Granularity::Month {
        if let Some(prev) = local_datetime(timestamp, offset).checked_sub_months(Months::new(1)) {
            return prev.timestamp();
        }
    }
    timestamp.saturating_sub(granularity.interval_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 00:00:00 UTC
    const JAN_1: i64 = 1_704_067_200;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_hour_key_is_zero_padded() {
        let ts = JAN_1 + 9 * 3600 + 59 * 60;
        assert_eq!(bucket_key(ts, Granularity::Hour, &utc()), "01-01 09:00");
    }

    #[test]
    fn test_day_key() {
        assert_eq!(bucket_key(JAN_1 + 2 * SECS_PER_DAY, Granularity::Day, &utc()), "01-03");
    }

    #[test]
    fn test_week_key_spans_six_days() {
        assert_eq!(bucket_key(JAN_1, Granularity::Week, &utc()), "01-01 - 01-07");
        // 2024-01-29 -> 2024-02-04 crosses a month
        let ts = JAN_1 + 28 * SECS_PER_DAY;
        assert_eq!(bucket_key(ts, Granularity::Week, &utc()), "01-29 - 02-04");
    }

    #[test]
    fn test_month_key_has_year() {
        assert_eq!(bucket_key(JAN_1, Granularity::Month, &utc()), "2024-01");
    }

    #[test]
    fn test_key_uses_local_offset() {
        // 2024-01-01 00:00 UTC is still 2023-12-31 in UTC-5
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(bucket_key(JAN_1, Granularity::Day, &offset), "12-31");
        assert_eq!(bucket_key(JAN_1, Granularity::Hour, &offset), "12-31 19:00");
    }

    #[test]
    fn test_keys_sort_chronologically_within_year() {
        let keys: Vec<String> = (0..40)
            .map(|d| bucket_key(JAN_1 + d * SECS_PER_DAY, Granularity::Day, &utc()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_month_stepping_is_calendar_aware() {
        // 2024-01-31 -> 2024-02-29 -> 2024-03-29
        let jan_31 = JAN_1 + 30 * SECS_PER_DAY;
        let feb = next_bucket(jan_31, Granularity::Month, &utc());
        assert_eq!(bucket_key(feb, Granularity::Month, &utc()), "2024-02");
        let mar = next_bucket(feb, Granularity::Month, &utc());
        assert_eq!(bucket_key(mar, Granularity::Month, &utc()), "2024-03");
        assert_eq!(prev_bucket(mar, Granularity::Month, &utc()), feb);
    }

    #[test]
    fn test_fixed_stepping() {
        assert_eq!(next_bucket(JAN_1, Granularity::Hour, &utc()), JAN_1 + 3600);
        assert_eq!(prev_bucket(JAN_1, Granularity::Week, &utc()), JAN_1 - 7 * SECS_PER_DAY);
    }

    #[test]
    fn test_parse_falls_back_to_day() {
        assert_eq!(Granularity::parse("HOUR"), Granularity::Hour);
        assert_eq!(Granularity::parse(" month "), Granularity::Month);
        assert_eq!(Granularity::parse("fortnight"), Granularity::Day);
        let g: Granularity = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(g, Granularity::Week);
        assert_eq!(serde_json::to_string(&Granularity::Hour).unwrap(), "\"hour\"");
    }

    #[test]
    fn test_out_of_range_timestamp_does_not_panic() {
        assert_eq!(bucket_key(i64::MAX, Granularity::Day, &utc()), "01-01");
        let _ = bucket_key(i64::MIN, Granularity::Week, &utc());
    }
}
