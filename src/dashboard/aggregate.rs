//! Accumulators over raw usage records.
//!
//! Two passes feed the dashboard: `process_raw_data` keys everything by
//! bucket alone (totals and sparklines), `aggregate_by_time_and_model`
//! cross-tabulates bucket x model (stacked bar, trend line, ranking).
//! Both start from empty maps and only ever add, so the result does not
//! depend on record order.

use std::collections::BTreeMap;

use super::bucket::bucket_key;
use super::context::DashboardContext;
use crate::models::analytics::{ModelTimeEntry, ProcessedUsage};
use crate::models::usage::UsageRecord;

/// A running total that never panics: counters saturate at their maximum,
/// amounts follow float arithmetic.
pub trait Accumulate {
    fn accumulate(&mut self, value: Self);
}

impl Accumulate for u64 {
    fn accumulate(&mut self, value: Self) {
        *self = self.saturating_add(value);
    }
}

impl Accumulate for f64 {
    fn accumulate(&mut self, value: Self) {
        *self += value;
    }
}

/// Add `value` to the running total under `key`, starting from zero.
pub fn update_map_value<K, V>(map: &mut BTreeMap<K, V>, key: K, value: V)
where
    K: Ord,
    V: Accumulate + Default,
{
    map.entry(key).or_default().accumulate(value);
}

/// Make sure `key` exists (as zero) in every map.
pub fn initialize_maps<K, V>(key: &K, maps: &mut [&mut BTreeMap<K, V>])
where
    K: Ord + Clone,
    V: Default,
{
    for map in maps.iter_mut() {
        map.entry(key.clone()).or_default();
    }
}

/// Single forward pass: grand totals, distinct models, and per-bucket sums.
///
/// `time_points` keeps first-seen order on purpose; see `ProcessedUsage`.
pub fn process_raw_data(records: &[UsageRecord], ctx: &DashboardContext) -> ProcessedUsage {
    let mut result = ProcessedUsage::default();

    for record in records {
        result.unique_models.insert(record.model_name.clone());
        result.total_tokens.accumulate(record.token_used);
        result.total_quota.accumulate(record.quota);
        result.total_times.accumulate(record.count);

        let time_key = bucket_key(record.created_at, ctx.granularity, &ctx.offset);
        if !result.time_quota_map.contains_key(&time_key) {
            result.time_points.push(time_key.clone());
        }

        initialize_maps(
            &time_key,
            &mut [&mut result.time_tokens_map, &mut result.time_count_map],
        );
        update_map_value(&mut result.time_quota_map, time_key.clone(), record.quota);
        update_map_value(&mut result.time_tokens_map, time_key.clone(), record.token_used);
        update_map_value(&mut result.time_count_map, time_key, record.count);
    }

    result
}

/// Composite map key for a (bucket, model) pair.
pub fn time_model_key(time: &str, model: &str) -> String {
    format!("{}-{}", time, model)
}

/// Cross-tabulate quota and call count by (bucket, model).
pub fn aggregate_by_time_and_model(
    records: &[UsageRecord],
    ctx: &DashboardContext,
) -> BTreeMap<String, ModelTimeEntry> {
    let mut aggregated: BTreeMap<String, ModelTimeEntry> = BTreeMap::new();

    for record in records {
        let time = bucket_key(record.created_at, ctx.granularity, &ctx.offset);
        let key = time_model_key(&time, &record.model_name);

        let entry = aggregated.entry(key).or_insert_with(|| ModelTimeEntry {
            time,
            model: record.model_name.clone(),
            quota: 0.0,
            count: 0,
        });
        entry.quota.accumulate(record.quota);
        entry.count.accumulate(record.count);
    }

    aggregated
}

/// Re-aggregate the cross-tab by model only: total calls per model.
pub fn model_totals(aggregated: &BTreeMap<String, ModelTimeEntry>) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for entry in aggregated.values() {
        update_map_value(&mut totals, entry.model.clone(), entry.count);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::bucket::Granularity;

    const JAN_1: i64 = 1_704_067_200;
    const DAY: i64 = 86_400;

    fn ctx() -> DashboardContext {
        DashboardContext::new(Granularity::Day)
    }

    fn sample() -> Vec<UsageRecord> {
        vec![
            UsageRecord::new(JAN_1 + 2 * DAY, "gpt-4", 30.0, 1, 100),
            UsageRecord::new(JAN_1, "gpt-4", 100.0, 2, 500),
            UsageRecord::new(JAN_1 + 3600, "claude-2.1", 40.0, 4, 80),
            UsageRecord::new(JAN_1, "gpt-4", 50.0, 1, 200),
            UsageRecord::new(JAN_1 + 2 * DAY, "claude-2.1", 5.5, 3, 10),
        ]
    }

    #[test]
    fn test_update_map_value_accumulates() {
        let mut map = BTreeMap::new();
        update_map_value(&mut map, "a", 1u64);
        update_map_value(&mut map, "a", 2u64);
        update_map_value(&mut map, "b", 0u64);
        assert_eq!(map.get("a"), Some(&3));
        assert_eq!(map.get("b"), Some(&0));
    }

    #[test]
    fn test_initialize_maps_keeps_existing_values() {
        let mut a: BTreeMap<&str, u64> = BTreeMap::new();
        let mut b: BTreeMap<&str, u64> = BTreeMap::new();
        a.insert("k", 5);
        initialize_maps(&"k", &mut [&mut a, &mut b]);
        assert_eq!(a["k"], 5);
        assert_eq!(b["k"], 0);
    }

    #[test]
    fn test_same_bucket_rows_are_summed() {
        let records = vec![
            UsageRecord::new(JAN_1, "gpt-4", 100.0, 2, 500),
            UsageRecord::new(JAN_1, "gpt-4", 50.0, 1, 200),
        ];
        let processed = process_raw_data(&records, &ctx());
        assert_eq!(processed.total_quota, 150.0);
        assert_eq!(processed.total_times, 3);
        assert_eq!(processed.total_tokens, 700);

        let aggregated = aggregate_by_time_and_model(&records, &ctx());
        assert_eq!(aggregated.len(), 1);
        let entry = &aggregated["01-01-gpt-4"];
        assert_eq!(entry.time, "01-01");
        assert_eq!(entry.model, "gpt-4");
        assert_eq!(entry.quota, 150.0);
        assert_eq!(entry.count, 3);
    }

    #[test]
    fn test_time_points_keep_first_seen_order() {
        let processed = process_raw_data(&sample(), &ctx());
        assert_eq!(processed.time_points, vec!["01-03", "01-01"]);
        assert_eq!(processed.time_quota_map["01-01"], 190.0);
        assert_eq!(processed.time_count_map["01-03"], 4);
        assert_eq!(processed.time_tokens_map["01-01"], 780);
        assert_eq!(processed.unique_models.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let processed = process_raw_data(&[], &ctx());
        assert_eq!(processed.total_quota, 0.0);
        assert_eq!(processed.total_times, 0);
        assert_eq!(processed.total_tokens, 0);
        assert!(processed.unique_models.is_empty());
        assert!(processed.time_points.is_empty());
        assert!(aggregate_by_time_and_model(&[], &ctx()).is_empty());
    }

    #[test]
    fn test_total_conservation() {
        let records = sample();
        let processed = process_raw_data(&records, &ctx());
        let aggregated = aggregate_by_time_and_model(&records, &ctx());

        let quota: f64 = aggregated.values().map(|e| e.quota).sum();
        let count: u64 = aggregated.values().map(|e| e.count).sum();
        assert!((quota - processed.total_quota).abs() < 1e-9);
        assert_eq!(count, processed.total_times);
        assert_eq!(model_totals(&aggregated).values().sum::<u64>(), processed.total_times);
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let records = sample();
        let expected = aggregate_by_time_and_model(&records, &ctx());
        let expected_totals = process_raw_data(&records, &ctx());

        let mut orderings = Vec::new();
        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                let mut swapped = records.clone();
                swapped.swap(i, j);
                orderings.push(swapped);
            }
            let mut rotated = records.clone();
            rotated.rotate_left(i);
            orderings.push(rotated);
        }
        let mut reversed = records.clone();
        reversed.reverse();
        orderings.push(reversed);

        for shuffled in orderings {
            assert_eq!(aggregate_by_time_and_model(&shuffled, &ctx()), expected);
            let processed = process_raw_data(&shuffled, &ctx());
            assert_eq!(processed.total_quota, expected_totals.total_quota);
            assert_eq!(processed.total_times, expected_totals.total_times);
            assert_eq!(processed.time_quota_map, expected_totals.time_quota_map);
            assert_eq!(processed.unique_models, expected_totals.unique_models);
        }
    }

    #[test]
    fn test_huge_counters_saturate() {
        let records = vec![
            UsageRecord::new(JAN_1, "gpt-4", 1.0, u64::MAX, u64::MAX),
            UsageRecord::new(JAN_1, "gpt-4", 1.0, 1, 5),
            UsageRecord::new(JAN_1 + DAY, "gpt-4", 1.0, u64::MAX, 0),
        ];
        let processed = process_raw_data(&records, &ctx());
        assert_eq!(processed.total_times, u64::MAX);
        assert_eq!(processed.total_tokens, u64::MAX);
        assert_eq!(processed.time_count_map["01-01"], u64::MAX);
        assert_eq!(processed.time_tokens_map["01-01"], u64::MAX);

        let aggregated = aggregate_by_time_and_model(&records, &ctx());
        assert_eq!(aggregated["01-01-gpt-4"].count, u64::MAX);
        assert_eq!(model_totals(&aggregated)["gpt-4"], u64::MAX);
    }

    #[test]
    fn test_model_totals() {
        let aggregated = aggregate_by_time_and_model(&sample(), &ctx());
        let totals = model_totals(&aggregated);
        assert_eq!(totals["gpt-4"], 4);
        assert_eq!(totals["claude-2.1"], 7);
    }
}
