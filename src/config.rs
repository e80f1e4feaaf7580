use chrono::{FixedOffset, Local, Offset};

use crate::dashboard::context::{DEFAULT_QUOTA_PER_UNIT, MAX_TREND_POINTS};
use crate::dashboard::format::QuotaDisplay;
use crate::dashboard::{DashboardContext, Granularity, QueryWindow};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL of the backend serving `/api/data`.
    pub backend_url: String,
    /// Bearer token sent to the backend.
    pub access_token: Option<String>,
    /// Required in `X-Admin-Key` on the HTTP API when set.
    pub admin_key: Option<String>,
    pub default_time: Granularity,
    /// Offset from UTC, in minutes, used as the dashboard's local time.
    pub utc_offset_minutes: i32,
    pub quota_per_unit: f64,
    /// USD, CNY, CUSTOM or TOKENS.
    pub quota_display: String,
    pub usd_exchange_rate: f64,
    pub custom_currency_symbol: String,
    pub custom_currency_rate: f64,
    pub min_chart_points: usize,
    pub backend_max_retries: u32,
}

impl Config {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(chrono::Utc.fix())
    }

    pub fn display(&self) -> QuotaDisplay {
        QuotaDisplay::from_settings(
            &self.quota_display,
            self.usd_exchange_rate,
            &self.custom_currency_symbol,
            self.custom_currency_rate,
        )
    }

    /// Pipeline context for one refresh.
    pub fn context(&self, granularity: Option<Granularity>, window: Option<QueryWindow>) -> DashboardContext {
        DashboardContext::new(granularity.unwrap_or(self.default_time))
            .with_offset(self.offset())
            .with_display(self.display(), self.quota_per_unit)
            .with_min_chart_points(self.min_chart_points)
            .with_window(window)
    }
}

fn parsed<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Build the config from a variable lookup. Unparseable numbers fall back
/// to their defaults; out-of-range values are rejected.
pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let local_offset_minutes = Local::now().offset().fix().local_minus_utc() / 60;

    let utc_offset_minutes = parsed(&get, "DASHBOARD_UTC_OFFSET_MINUTES", local_offset_minutes);
    if utc_offset_minutes.abs() >= 24 * 60 {
        anyhow::bail!(
            "DASHBOARD_UTC_OFFSET_MINUTES must be within +/-1439, got {}",
            utc_offset_minutes
        );
    }

    let quota_per_unit = parsed(&get, "DASHBOARD_QUOTA_PER_UNIT", DEFAULT_QUOTA_PER_UNIT);
    if !quota_per_unit.is_finite() || quota_per_unit <= 0.0 {
        anyhow::bail!("DASHBOARD_QUOTA_PER_UNIT must be positive, got {}", quota_per_unit);
    }

    Ok(Config {
        port: parsed(&get, "DASHBOARD_PORT", 8090),
        backend_url: get("DASHBOARD_BACKEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
        access_token: get("DASHBOARD_ACCESS_TOKEN").filter(|s| !s.is_empty()),
        admin_key: get("DASHBOARD_ADMIN_KEY").filter(|s| !s.is_empty()),
        default_time: get("DASHBOARD_DEFAULT_TIME")
            .map(|v| Granularity::parse(&v))
            .unwrap_or(Granularity::Hour),
        utc_offset_minutes,
        quota_per_unit,
        quota_display: get("DASHBOARD_QUOTA_DISPLAY").unwrap_or_else(|| "USD".into()),
        usd_exchange_rate: parsed(&get, "DASHBOARD_USD_EXCHANGE_RATE", 7.0),
        custom_currency_symbol: get("DASHBOARD_CURRENCY_SYMBOL").unwrap_or_else(|| "¤".into()),
        custom_currency_rate: parsed(&get, "DASHBOARD_CURRENCY_RATE", 1.0),
        min_chart_points: parsed(&get, "DASHBOARD_MIN_CHART_POINTS", MAX_TREND_POINTS),
        backend_max_retries: parsed(&get, "DASHBOARD_BACKEND_MAX_RETRIES", 3),
    })
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}
