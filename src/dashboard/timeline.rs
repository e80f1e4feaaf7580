//! Canonical x-axis for the time-based charts.

use std::collections::{BTreeMap, BTreeSet};

use super::bucket::{bucket_key, next_bucket, prev_bucket};
use super::context::DashboardContext;
use crate::models::analytics::ModelTimeEntry;
use crate::models::usage::UsageRecord;

/// Upper bound on generated axis buckets (about a year of hours).
pub const MAX_AXIS_BUCKETS: usize = 9_000;

/// Sorted, deduplicated bucket keys covering every bucket between the
/// earliest and latest record, including buckets nobody used.
///
/// Keys present in `aggregated` are always part of the axis even when
/// stepping from the earliest timestamp would land on a different bucket
/// boundary. If the axis comes out shorter than `ctx.min_chart_points`, it
/// is extended backward from the latest record.
pub fn generate_chart_time_points(
    aggregated: &BTreeMap<String, ModelTimeEntry>,
    records: &[UsageRecord],
    ctx: &DashboardContext,
) -> Vec<String> {
    let mut points: BTreeSet<String> = aggregated.values().map(|e| e.time.clone()).collect();

    let (Some(first), Some(last)) = (
        records.iter().map(|r| r.created_at).min(),
        records.iter().map(|r| r.created_at).max(),
    ) else {
        return points.into_iter().collect();
    };

    let granularity = ctx.granularity;
    let mut ts = first;
    let mut steps = 0;
    while ts <= last {
        if steps == MAX_AXIS_BUCKETS {
            tracing::warn!(
                granularity = %granularity,
                first,
                last,
                "chart axis truncated at {} buckets",
                MAX_AXIS_BUCKETS
            );
            break;
        }
        points.insert(bucket_key(ts, granularity, &ctx.offset));
        let next = next_bucket(ts, granularity, &ctx.offset);
        if next <= ts {
            break;
        }
        ts = next;
        steps += 1;
    }

    if points.len() < ctx.min_chart_points {
        let mut ts = last;
        // every step adds a new key except when a key repeats
        for _ in 0..ctx.min_chart_points * 2 {
            if points.len() >= ctx.min_chart_points {
                break;
            }
            points.insert(bucket_key(ts, granularity, &ctx.offset));
            ts = prev_bucket(ts, granularity, &ctx.offset);
        }
    }

    points.into_iter().collect()
}
