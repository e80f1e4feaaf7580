//! Number and quota rendering for chart titles and summary cards.

use serde::{Deserialize, Serialize};

/// How quota amounts are shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum QuotaDisplay {
    #[default]
    Usd,
    Cny { rate: f64 },
    Custom { symbol: String, rate: f64 },
    /// Raw quota numbers, compacted like call counts.
    Tokens,
}

impl QuotaDisplay {
    /// Build from the console's display setting. Unknown kinds show USD.
    pub fn from_settings(kind: &str, usd_rate: f64, custom_symbol: &str, custom_rate: f64) -> Self {
        match kind.trim().to_ascii_uppercase().as_str() {
            "CNY" => QuotaDisplay::Cny { rate: usd_rate },
            "CUSTOM" => QuotaDisplay::Custom {
                symbol: custom_symbol.to_string(),
                rate: custom_rate,
            },
            "TOKENS" => QuotaDisplay::Tokens,
            _ => QuotaDisplay::Usd,
        }
    }

    fn symbol_and_rate(&self) -> (&str, f64) {
        match self {
            QuotaDisplay::Usd | QuotaDisplay::Tokens => ("$", 1.0),
            QuotaDisplay::Cny { rate } => ("¥", *rate),
            QuotaDisplay::Custom { symbol, rate } => (symbol.as_str(), *rate),
        }
    }
}

/// Compact a count: `12345 -> "12.3k"`, `2500000 -> "2.5M"`.
/// Values below 10 000 are printed as-is.
pub fn render_number(num: f64) -> String {
    if num >= 1_000_000_000.0 {
        format!("{:.1}B", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("{:.1}M", num / 1_000_000.0)
    } else if num >= 10_000.0 {
        format!("{:.1}k", num / 1_000.0)
    } else {
        format!("{}", num)
    }
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Quota converted to display units, rounded to `digits` decimals.
/// A zero `quota_per_unit` yields 0.
pub fn quota_with_unit(quota: f64, quota_per_unit: f64, digits: u32) -> f64 {
    let value = quota / quota_per_unit;
    if value.is_finite() {
        round_to(value, digits)
    } else {
        0.0
    }
}

/// Quota as a currency string, e.g. `"$1.50"`.
///
/// Any positive amount that would round to zero is shown as the smallest
/// visible value (`$0.01` at two digits) so small spend never reads as free.
pub fn render_quota(quota: f64, digits: usize, display: &QuotaDisplay, quota_per_unit: f64) -> String {
    if *display == QuotaDisplay::Tokens {
        return render_number(quota);
    }

    let (symbol, rate) = display.symbol_and_rate();
    let mut value = quota / quota_per_unit * rate;
    if !value.is_finite() {
        value = 0.0;
    }

    let fixed = format!("{:.*}", digits, value);
    if fixed.parse::<f64>().unwrap_or(0.0) == 0.0 && quota > 0.0 && value > 0.0 {
        let min_value = 10f64.powi(-(digits as i32));
        return format!("{}{:.*}", symbol, digits, min_value);
    }
    format!("{}{}", symbol, fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PER_UNIT: f64 = 500_000.0;

    #[test]
    fn test_render_number_thresholds() {
        assert_eq!(render_number(0.0), "0");
        assert_eq!(render_number(9_999.0), "9999");
        assert_eq!(render_number(12_345.0), "12.3k");
        assert_eq!(render_number(2_500_000.0), "2.5M");
        assert_eq!(render_number(3_210_000_000.0), "3.2B");
    }

    #[test]
    fn test_render_quota_usd() {
        assert_eq!(render_quota(750_000.0, 2, &QuotaDisplay::Usd, PER_UNIT), "$1.50");
        assert_eq!(render_quota(0.0, 2, &QuotaDisplay::Usd, PER_UNIT), "$0.00");
    }

    #[test]
    fn test_render_quota_minimum_visible_value() {
        // 10 quota = $0.00002, rounds to zero at two digits
        assert_eq!(render_quota(10.0, 2, &QuotaDisplay::Usd, PER_UNIT), "$0.01");
        assert_eq!(render_quota(10.0, 4, &QuotaDisplay::Usd, PER_UNIT), "$0.0001");
    }

    #[test]
    fn test_render_quota_currencies() {
        let cny = QuotaDisplay::from_settings("cny", 7.0, "", 1.0);
        assert_eq!(render_quota(500_000.0, 2, &cny, PER_UNIT), "¥7.00");

        let custom = QuotaDisplay::from_settings("CUSTOM", 7.0, "€", 0.5);
        assert_eq!(render_quota(500_000.0, 2, &custom, PER_UNIT), "€0.50");

        let tokens = QuotaDisplay::from_settings("TOKENS", 7.0, "", 1.0);
        assert_eq!(render_quota(25_000.0, 2, &tokens, PER_UNIT), "25.0k");

        assert_eq!(QuotaDisplay::from_settings("???", 7.0, "", 1.0), QuotaDisplay::Usd);
    }

    #[test]
    fn test_zero_per_unit_does_not_produce_nan() {
        assert_eq!(render_quota(100.0, 2, &QuotaDisplay::Usd, 0.0), "$0.00");
        assert_eq!(quota_with_unit(100.0, 0.0, 4), 0.0);
    }

    #[test]
    fn test_quota_with_unit_rounds() {
        assert_eq!(quota_with_unit(150.0, PER_UNIT, 4), 0.0003);
        assert_eq!(quota_with_unit(1_000_000.0, PER_UNIT, 4), 2.0);
    }
}
