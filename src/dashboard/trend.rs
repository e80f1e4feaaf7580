//! Sparkline series and rate metrics for the summary cards.

use serde_json::{json, Value};

use super::bucket::Granularity;
use super::context::QueryWindow;
use super::spec::ChartSpec;
use crate::models::analytics::{PerformanceMetrics, ProcessedUsage, TrendData};

/// `numerator / minutes`, or 0 when the ratio is not a finite number.
pub fn per_minute(numerator: f64, minutes: f64) -> f64 {
    let rate = numerator / minutes;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

/// Rate formatted with three decimals; `"0"` when undefined.
fn format_rate(numerator: f64, minutes: f64) -> String {
    if minutes <= 0.0 || minutes.is_nan() {
        return "0".to_string();
    }
    let rate = numerator / minutes;
    if rate.is_finite() {
        format!("{:.3}", rate)
    } else {
        "0".to_string()
    }
}

/// Build the card sparklines. Every series has one value per entry of
/// `processed.time_points`, in that order; missing buckets read as 0.
pub fn calculate_trend_data(processed: &ProcessedUsage, granularity: Granularity) -> TrendData {
    let interval = granularity.interval_minutes() as f64;
    let points = &processed.time_points;

    let quota_at = |t: &String| processed.time_quota_map.get(t).copied().unwrap_or(0.0);
    let tokens_at = |t: &String| processed.time_tokens_map.get(t).copied().unwrap_or(0);
    let count_at = |t: &String| processed.time_count_map.get(t).copied().unwrap_or(0);

    TrendData {
        times: points.iter().map(count_at).collect(),
        consume_quota: points.iter().map(quota_at).collect(),
        tokens: points.iter().map(tokens_at).collect(),
        rpm: points
            .iter()
            .map(|t| per_minute(count_at(t) as f64, interval))
            .collect(),
        tpm: points
            .iter()
            .map(|t| per_minute(tokens_at(t) as f64, interval))
            .collect(),
    }
}

/// Average RPM/TPM over the whole query window.
pub fn performance_metrics(total_times: u64, total_tokens: u64, window: QueryWindow) -> PerformanceMetrics {
    let seconds = i128::from(window.end) - i128::from(window.start);
    let minutes = seconds as f64 / 60.0;
    PerformanceMetrics {
        avg_rpm: format_rate(total_times as f64, minutes),
        avg_tpm: format_rate(total_tokens as f64, minutes),
        time_diff_minutes: minutes,
    }
}

/// Tiny axis-less line chart for a summary card.
pub fn sparkline_spec(values: &[f64], color: &str) -> ChartSpec {
    let points: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(idx, val)| json!({ "x": idx, "y": val }))
        .collect();

    ChartSpec(json!({
        "type": "line",
        "data": [{ "id": "trend", "values": points }],
        "xField": "x",
        "yField": "y",
        "height": 40,
        "width": 100,
        "axes": [
            { "orient": "bottom", "visible": false },
            { "orient": "left", "visible": false }
        ],
        "padding": 0,
        "autoFit": false,
        "legends": { "visible": false },
        "tooltip": { "visible": false },
        "crosshair": { "visible": false },
        "line": { "style": { "stroke": color, "lineWidth": 2 } },
        "point": { "visible": false },
        "background": { "fill": "transparent" }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::aggregate::process_raw_data;
    use crate::dashboard::context::DashboardContext;
    use crate::models::usage::UsageRecord;

    const JAN_1: i64 = 1_704_067_200;

    #[test]
    fn test_series_align_with_time_points() {
        let records = vec![
            UsageRecord::new(JAN_1 + 7200, "a", 10.0, 120, 6000),
            UsageRecord::new(JAN_1, "a", 5.0, 60, 600),
            UsageRecord::new(JAN_1 + 300, "b", 1.0, 60, 0),
        ];
        let ctx = DashboardContext::new(Granularity::Hour);
        let processed = process_raw_data(&records, &ctx);
        let trend = calculate_trend_data(&processed, Granularity::Hour);

        assert_eq!(processed.time_points, vec!["01-01 02:00", "01-01 00:00"]);
        assert_eq!(trend.times, vec![120, 120]);
        assert_eq!(trend.consume_quota, vec![10.0, 6.0]);
        assert_eq!(trend.tokens, vec![6000, 600]);
        assert_eq!(trend.rpm, vec![2.0, 2.0]);
        assert_eq!(trend.tpm, vec![100.0, 10.0]);
    }

    #[test]
    fn test_single_bucket_still_has_rates() {
        let records = vec![UsageRecord::new(JAN_1, "a", 1.0, 1440, 2880)];
        let ctx = DashboardContext::new(Granularity::Day);
        let trend = calculate_trend_data(&process_raw_data(&records, &ctx), Granularity::Day);
        assert_eq!(trend.rpm, vec![1.0]);
        assert_eq!(trend.tpm, vec![2.0]);
    }

    #[test]
    fn test_missing_bucket_reads_as_zero() {
        let mut processed = ProcessedUsage::default();
        processed.time_points.push("01-05".to_string());
        let trend = calculate_trend_data(&processed, Granularity::Day);
        assert_eq!(trend.times, vec![0]);
        assert_eq!(trend.consume_quota, vec![0.0]);
        assert_eq!(trend.rpm, vec![0.0]);
    }

    #[test]
    fn test_empty_trend() {
        let trend = calculate_trend_data(&ProcessedUsage::default(), Granularity::Week);
        assert_eq!(trend, TrendData::default());
    }

    #[test]
    fn test_per_minute_guards_non_finite() {
        assert_eq!(per_minute(10.0, 0.0), 0.0);
        assert_eq!(per_minute(0.0, 0.0), 0.0);
        assert_eq!(per_minute(30.0, 60.0), 0.5);
    }

    #[test]
    fn test_performance_metrics() {
        let window = QueryWindow { start: 0, end: 3600 };
        let metrics = performance_metrics(120, 6000, window);
        assert_eq!(metrics.avg_rpm, "2.000");
        assert_eq!(metrics.avg_tpm, "100.000");
        assert_eq!(metrics.time_diff_minutes, 60.0);
    }

    #[test]
    fn test_performance_metrics_zero_window() {
        let window = QueryWindow { start: 100, end: 100 };
        let metrics = performance_metrics(0, 0, window);
        assert_eq!(metrics.avg_rpm, "0");
        assert_eq!(metrics.avg_tpm, "0");

        let metrics = performance_metrics(5, 5, window);
        assert_eq!(metrics.avg_rpm, "0");

        let inverted = QueryWindow { start: 200, end: 100 };
        assert_eq!(performance_metrics(5, 5, inverted).avg_tpm, "0");
    }

    #[test]
    fn test_performance_metrics_full_range_window() {
        let window = QueryWindow { start: i64::MIN, end: i64::MAX };
        let metrics = performance_metrics(u64::MAX, 10, window);
        assert!(metrics.time_diff_minutes.is_finite());
        assert!(metrics.time_diff_minutes > 0.0);
        assert_eq!(metrics.avg_tpm, "0.000");
        assert!(metrics.avg_rpm.parse::<f64>().unwrap() > 0.0);
    }

    #[test]
    fn test_sparkline_spec_shape() {
        let spec = sparkline_spec(&[1.0, 3.0], "#1664FF");
        let v = &spec.0;
        assert_eq!(v["type"], "line");
        assert_eq!(v["data"][0]["values"][1]["x"], 1);
        assert_eq!(v["data"][0]["values"][1]["y"], 3.0);
        assert_eq!(v["line"]["style"]["stroke"], "#1664FF");
    }
}
