use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Output of the single pass over raw records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedUsage {
    pub total_quota: f64,
    pub total_times: u64,
    pub total_tokens: u64,
    pub unique_models: BTreeSet<String>,
    /// Bucket keys in first-seen order. NOT chronological: callers that
    /// need a sorted axis use the chart time points instead.
    pub time_points: Vec<String>,
    pub time_quota_map: BTreeMap<String, f64>,
    pub time_tokens_map: BTreeMap<String, u64>,
    pub time_count_map: BTreeMap<String, u64>,
}

/// Accumulated quota and call count for one (bucket, model) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelTimeEntry {
    pub time: String,
    pub model: String,
    pub quota: f64,
    pub count: u64,
}

/// Sparkline series for the summary cards, positionally aligned with
/// `ProcessedUsage::time_points`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub times: Vec<u64>,
    pub consume_quota: Vec<f64>,
    pub tokens: Vec<u64>,
    pub rpm: Vec<f64>,
    pub tpm: Vec<f64>,
}

/// Average request/token rates over the query window.
/// Rates are pre-formatted with three decimals; an undefined rate is `"0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_rpm: String,
    pub avg_tpm: String,
    pub time_diff_minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_quota: f64,
    pub total_times: u64,
    pub total_tokens: u64,
    pub model_count: usize,
}

// ── Chart rows ───────────────────────────────────────────────
// Field names follow what the chart layer binds to (`xField`, `yField`,
// `seriesField`), hence the renames.

/// Model-share pie slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieDatum {
    #[serde(rename = "type")]
    pub model: String,
    pub value: u64,
}

/// Stacked time/model bar row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBarDatum {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Model")]
    pub model: String,
    /// Quota converted to display units (4 decimals), 0 for empty cells.
    #[serde(rename = "Usage")]
    pub usage: f64,
    #[serde(rename = "rawQuota")]
    pub raw_quota: f64,
    /// Sum of `raw_quota` over every model in the same bucket.
    #[serde(rename = "TimeSum")]
    pub time_sum: f64,
}

/// Per-model call-count trend point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLineDatum {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Count")]
    pub count: u64,
}

/// Call-count ranking bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankDatum {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Count")]
    pub count: u64,
}
