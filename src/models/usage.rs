//! Raw usage rows as reported by the backend's `/api/data` endpoint.
//!
//! The backend is loose about numeric fields: older rows may omit
//! `token_used`, some proxies stringify numbers, and a failed join can
//! leave `null` behind. Every numeric field therefore deserializes
//! leniently and anything unusable becomes a zero contribution.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Model name the console uses for the placeholder row injected when a
/// query window has no usage at all.
pub const NO_DATA_MODEL: &str = "无数据";

/// One row per (time bucket, model) as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unix timestamp (seconds) of the bucket. Missing = 0.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model_name: String,
    /// Credits consumed. Missing, negative or non-numeric = 0.
    #[serde(default, deserialize_with = "lenient_quota")]
    pub quota: f64,
    /// Number of calls. Missing, negative or non-numeric = 0.
    #[serde(default, deserialize_with = "lenient_counter")]
    pub count: u64,
    /// Tokens used. Missing, negative or non-numeric = 0.
    #[serde(default, deserialize_with = "lenient_counter")]
    pub token_used: u64,
}

impl UsageRecord {
    pub fn new(created_at: i64, model_name: impl Into<String>, quota: f64, count: u64, token_used: u64) -> Self {
        Self {
            created_at,
            model_name: model_name.into(),
            quota: sanitize_amount(quota),
            count,
            token_used,
        }
    }

    /// Placeholder row the console shows when the backend returned nothing.
    pub fn no_data(created_at: i64) -> Self {
        Self::new(created_at, NO_DATA_MODEL, 0.0, 0, 0)
    }
}

/// `{ success, message, data }` envelope of `/api/data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// `null` is treated the same as an empty list.
    #[serde(default, deserialize_with = "nullable_records")]
    pub data: Vec<UsageRecord>,
}

/// Input accepted from files and request bodies: either the full backend
/// envelope or a bare array of records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordsPayload {
    Bare(Vec<UsageRecord>),
    Envelope(DataResponse),
}

impl RecordsPayload {
    pub fn into_records(self) -> Vec<UsageRecord> {
        match self {
            RecordsPayload::Bare(records) => records,
            RecordsPayload::Envelope(resp) => resp.data,
        }
    }
}

// ── Lenient field decoding ────────────────────────────────────

fn sanitize_amount(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Numeric view of a JSON value: numbers as-is, numeric strings parsed.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_quota<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(numeric(&value).map(sanitize_amount).unwrap_or(0.0))
}

fn lenient_counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    Ok(numeric(&value)
        .map(sanitize_amount)
        .map(|v| v.trunc() as u64)
        .unwrap_or(0))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    Ok(numeric(&value)
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
        .unwrap_or(0))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn nullable_records<'de, D>(deserializer: D) -> Result<Vec<UsageRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<UsageRecord>>::deserialize(deserializer)?.unwrap_or_default())
}
