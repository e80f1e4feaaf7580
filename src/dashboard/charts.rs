//! Full dashboard refresh: raw records in, every chart and card out.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use super::aggregate::{aggregate_by_time_and_model, model_totals, process_raw_data, time_model_key};
use super::bucket::Granularity;
use super::color::{ColorAssigner, ModelColorMap};
use super::context::DashboardContext;
use super::format::{quota_with_unit, render_number, render_quota};
use super::spec::{self, update_chart_spec, ChartSpec};
use super::timeline::generate_chart_time_points;
use super::trend::{calculate_trend_data, performance_metrics, sparkline_spec};
use crate::models::analytics::{
    ModelLineDatum, ModelTimeEntry, PerformanceMetrics, PieDatum, RankDatum, StackedBarDatum,
    TrendData, UsageSummary,
};
use crate::models::usage::UsageRecord;

pub const PIE_TITLE: &str = "Model call share";
pub const STACKED_BAR_TITLE: &str = "Model consumption distribution";
pub const MODEL_LINE_TITLE: &str = "Model consumption trend";
pub const RANK_BAR_TITLE: &str = "Model call ranking";

/// Card sparkline colors, taken from the head of the base palette.
const SPARKLINE_COLORS: [(&str, &str); 5] = [
    ("times", "#1664FF"),
    ("consume_quota", "#1AC6FF"),
    ("tokens", "#FF8A00"),
    ("rpm", "#3CC780"),
    ("tpm", "#7442D4"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpecs {
    pub pie: ChartSpec,
    pub stacked_bar: ChartSpec,
    pub model_line: ChartSpec,
    pub rank_bar: ChartSpec,
}

/// Everything the dashboard renders after one refresh.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub granularity: Granularity,
    pub summary: UsageSummary,
    /// Bucket keys in first-seen order; `trend` is aligned with these.
    pub time_points: Vec<String>,
    pub trend: TrendData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
    /// Sorted, gap-filled axis of the time-based charts.
    pub chart_time_points: Vec<String>,
    pub model_colors: ModelColorMap,
    pub pie_data: Vec<PieDatum>,
    pub stacked_bar_data: Vec<StackedBarDatum>,
    pub model_line_data: Vec<ModelLineDatum>,
    pub rank_data: Vec<RankDatum>,
    pub specs: ChartSpecs,
    pub sparklines: BTreeMap<String, ChartSpec>,
}

/// Pie slices, largest first. Ties keep model-name order.
pub fn pie_data(totals: &BTreeMap<String, u64>) -> Vec<PieDatum> {
    let mut data: Vec<PieDatum> = totals
        .iter()
        .map(|(model, count)| PieDatum {
            model: model.clone(),
            value: *count,
        })
        .collect();
    data.sort_by(|a, b| b.value.cmp(&a.value));
    data
}

/// Ranking bars, most calls first. Ties keep model-name order.
pub fn rank_data(totals: &BTreeMap<String, u64>) -> Vec<RankDatum> {
    let mut data: Vec<RankDatum> = totals
        .iter()
        .map(|(model, count)| RankDatum {
            model: model.clone(),
            count: *count,
        })
        .collect();
    data.sort_by(|a, b| b.count.cmp(&a.count));
    data
}

/// One row per (axis bucket, model). Inside a bucket rows are ordered by
/// quota descending and carry the bucket total in `time_sum`.
pub fn stacked_bar_data(
    time_points: &[String],
    models: &BTreeSet<String>,
    aggregated: &BTreeMap<String, ModelTimeEntry>,
    ctx: &DashboardContext,
) -> Vec<StackedBarDatum> {
    let mut rows = Vec::with_capacity(time_points.len() * models.len());

    for time in time_points {
        let mut bucket: Vec<StackedBarDatum> = models
            .iter()
            .map(|model| {
                let raw_quota = aggregated
                    .get(&time_model_key(time, model))
                    .map(|e| e.quota)
                    .unwrap_or(0.0);
                StackedBarDatum {
                    time: time.clone(),
                    model: model.clone(),
                    usage: if raw_quota > 0.0 {
                        quota_with_unit(raw_quota, ctx.quota_per_unit, 4)
                    } else {
                        0.0
                    },
                    raw_quota,
                    time_sum: 0.0,
                }
            })
            .collect();

        let time_sum: f64 = bucket.iter().map(|row| row.raw_quota).sum();
        bucket.sort_by(|a, b| b.raw_quota.total_cmp(&a.raw_quota));
        for row in &mut bucket {
            row.time_sum = time_sum;
        }
        rows.extend(bucket);
    }

    rows.sort_by(|a, b| a.time.cmp(&b.time));
    rows
}

/// Call count per (axis bucket, model), zero where a model was idle.
pub fn model_line_data(
    time_points: &[String],
    models: &BTreeSet<String>,
    aggregated: &BTreeMap<String, ModelTimeEntry>,
) -> Vec<ModelLineDatum> {
    let mut rows: Vec<ModelLineDatum> = time_points
        .iter()
        .flat_map(|time| {
            models.iter().map(move |model| ModelLineDatum {
                time: time.clone(),
                model: model.clone(),
                count: aggregated
                    .get(&time_model_key(time, model))
                    .map(|e| e.count)
                    .unwrap_or(0),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.time.cmp(&b.time));
    rows
}

fn to_values<T: Serialize>(rows: &[T]) -> Value {
    serde_json::to_value(rows).unwrap_or_else(|_| Value::Array(Vec::new()))
}

/// Run the whole pipeline over `records`.
///
/// Never fails: malformed input has already been zeroed by
/// `UsageRecord` decoding and every ratio is guarded.
pub fn build_dashboard(records: &[UsageRecord], ctx: &DashboardContext) -> DashboardCharts {
    build_dashboard_with_colors(records, ctx, &mut ColorAssigner::new())
}

/// Same as [`build_dashboard`], reusing colors handed out by `colors`.
pub fn build_dashboard_with_colors(
    records: &[UsageRecord],
    ctx: &DashboardContext,
    colors: &mut ColorAssigner,
) -> DashboardCharts {
    let processed = process_raw_data(records, ctx);
    let trend = calculate_trend_data(&processed, ctx.granularity);
    let model_colors = colors.generate_model_colors(&processed.unique_models);

    let aggregated = aggregate_by_time_and_model(records, ctx);
    let totals = model_totals(&aggregated);
    let pie = pie_data(&totals);
    let rank = rank_data(&totals);

    let chart_time_points = generate_chart_time_points(&aggregated, records, ctx);
    let stacked = stacked_bar_data(&chart_time_points, &processed.unique_models, &aggregated, ctx);
    let model_line = model_line_data(&chart_time_points, &processed.unique_models, &aggregated);

    tracing::debug!(
        records = records.len(),
        models = processed.unique_models.len(),
        buckets = processed.time_points.len(),
        axis = chart_time_points.len(),
        granularity = %ctx.granularity,
        "dashboard charts rebuilt"
    );

    let times_subtitle = ctx.subtitle(&render_number(processed.total_times as f64));
    let quota_subtitle = ctx.subtitle(&render_quota(
        processed.total_quota,
        2,
        &ctx.display,
        ctx.quota_per_unit,
    ));

    let specs = ChartSpecs {
        pie: update_chart_spec(
            &spec::pie_spec(PIE_TITLE, &ctx.subtitle("0")),
            spec::PIE_DATA_ID,
            to_values(&pie),
            &times_subtitle,
            &model_colors,
        ),
        stacked_bar: update_chart_spec(
            &spec::stacked_bar_spec(STACKED_BAR_TITLE, &ctx.subtitle("0")),
            spec::STACKED_BAR_DATA_ID,
            to_values(&stacked),
            &quota_subtitle,
            &model_colors,
        ),
        model_line: update_chart_spec(
            &spec::model_line_spec(MODEL_LINE_TITLE, ""),
            spec::MODEL_LINE_DATA_ID,
            to_values(&model_line),
            &times_subtitle,
            &model_colors,
        ),
        rank_bar: update_chart_spec(
            &spec::rank_bar_spec(RANK_BAR_TITLE, ""),
            spec::RANK_BAR_DATA_ID,
            to_values(&rank),
            &times_subtitle,
            &model_colors,
        ),
    };

    let sparklines = SPARKLINE_COLORS
        .iter()
        .map(|(name, color)| {
            let values: Vec<f64> = match *name {
                "times" => trend.times.iter().map(|v| *v as f64).collect(),
                "consume_quota" => trend.consume_quota.clone(),
                "tokens" => trend.tokens.iter().map(|v| *v as f64).collect(),
                "rpm" => trend.rpm.clone(),
                _ => trend.tpm.clone(),
            };
            (name.to_string(), sparkline_spec(&values, color))
        })
        .collect();

    let performance = ctx
        .window
        .map(|w| performance_metrics(processed.total_times, processed.total_tokens, w));

    DashboardCharts {
        granularity: ctx.granularity,
        summary: UsageSummary {
            total_quota: processed.total_quota,
            total_times: processed.total_times,
            total_tokens: processed.total_tokens,
            model_count: processed.unique_models.len(),
        },
        time_points: processed.time_points,
        trend,
        performance,
        chart_time_points,
        model_colors,
        pie_data: pie,
        stacked_bar_data: stacked,
        model_line_data: model_line,
        rank_data: rank,
        specs,
        sparklines,
    }
}
