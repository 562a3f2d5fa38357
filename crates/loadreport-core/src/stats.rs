use std::collections::BTreeMap;

use crate::error::ReportError;
use crate::model::{LabelStats, OverallStats, Sample};

// ---------------------------------------------------------------------------
// aggregate
// ---------------------------------------------------------------------------

/// Aggregate a materialized sample sequence into overall and per-label
/// statistics.
///
/// Format-agnostic: the per-format error convention has already been
/// resolved into each sample's `success` flag by the adapter. An empty
/// sequence is an [`ReportError::Aggregation`], never a stats record with
/// undefined percentiles.
pub fn aggregate(
    samples: &[Sample],
) -> Result<(OverallStats, BTreeMap<String, LabelStats>), ReportError> {
    if samples.is_empty() {
        return Err(ReportError::Aggregation(
            "no samples to aggregate".to_string(),
        ));
    }

    let mut partitions: BTreeMap<&str, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        partitions.entry(&sample.label).or_default().push(sample);
    }

    let mut labels = BTreeMap::new();
    for (label, partition) in partitions {
        labels.insert(label.to_string(), label_stats(&partition));
    }

    let all: Vec<&Sample> = samples.iter().collect();
    let base = label_stats(&all);
    let test_duration_s = test_duration(&all);

    let overall = OverallStats {
        count: base.count,
        error_count: base.error_count,
        error_rate: base.error_rate,
        min_ms: base.min_ms,
        max_ms: base.max_ms,
        mean_ms: base.mean_ms,
        p50_ms: base.p50_ms,
        p90_ms: base.p90_ms,
        p95_ms: base.p95_ms,
        p99_ms: base.p99_ms,
        throughput_rps: safe_div(base.count as f64, test_duration_s),
        test_duration_s,
    };

    Ok((overall, labels))
}

/// Statistics over one partition. The partition is never empty: every
/// entry comes from at least one sample.
fn label_stats(partition: &[&Sample]) -> LabelStats {
    let count = partition.len() as u64;
    let error_count = partition.iter().filter(|s| !s.success).count() as u64;

    let mut latencies: Vec<f64> = partition.iter().map(|s| s.elapsed_ms).collect();
    latencies.sort_unstable_by(|a, b| a.total_cmp(b));

    let sum: f64 = latencies.iter().sum();
    let span_s = timestamp_span_s(partition);

    LabelStats {
        count,
        error_count,
        error_rate: safe_div(error_count as f64, count as f64),
        min_ms: latencies[0],
        max_ms: latencies[latencies.len() - 1],
        mean_ms: sum / count as f64,
        p50_ms: nearest_rank(&latencies, 0.50),
        p90_ms: nearest_rank(&latencies, 0.90),
        p95_ms: nearest_rank(&latencies, 0.95),
        p99_ms: nearest_rank(&latencies, 0.99),
        throughput_rps: safe_div(count as f64, span_s),
    }
}

/// Nearest-rank percentile over an ascending-sorted slice.
///
/// `index = floor(fraction * count)` clamped to `[0, count-1]`. Note the
/// scaling is by `count`, not `count - 1`: for 100 values p50 picks index
/// 50, the 51st smallest value.
fn nearest_rank(sorted: &[f64], fraction: f64) -> f64 {
    let idx = (fraction * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Seconds between the earliest and latest timestamps in a partition.
fn timestamp_span_s(partition: &[&Sample]) -> f64 {
    let (first, last) = timestamp_bounds(partition);
    (last.timestamp - first.timestamp).num_milliseconds().max(0) as f64 / 1000.0
}

/// Overall test window: the timestamp span widened by the boundary
/// samples' own latencies, since the test start precedes the first
/// completion and the test end follows the last start. A single sample's
/// window is just its own latency.
fn test_duration(samples: &[&Sample]) -> f64 {
    if samples.len() == 1 {
        return samples[0].elapsed_ms / 1000.0;
    }
    let (first, last) = timestamp_bounds(samples);
    let span = (last.timestamp - first.timestamp).num_milliseconds().max(0) as f64 / 1000.0;
    span + first.elapsed_ms / 1000.0 + last.elapsed_ms / 1000.0
}

fn timestamp_bounds<'a>(samples: &[&'a Sample]) -> (&'a Sample, &'a Sample) {
    let mut first = samples[0];
    let mut last = samples[0];
    for &s in &samples[1..] {
        if s.timestamp < first.timestamp {
            first = s;
        }
        if s.timestamp > last.timestamp {
            last = s;
        }
    }
    (first, last)
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(label: &str, offset_s: i64, elapsed_ms: f64, success: bool) -> Sample {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        Sample::new(
            label,
            base + chrono::Duration::seconds(offset_s),
            elapsed_ms,
            success,
        )
    }

    // -----------------------------------------------------------------------
    // nearest_rank
    // -----------------------------------------------------------------------

    #[test]
    fn nearest_rank_scales_by_count_not_count_minus_one() {
        // 100 values 1..=100: p50 must pick index 50, the 51st smallest.
        let sorted: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(nearest_rank(&sorted, 0.50), 51.0);
        assert_eq!(nearest_rank(&sorted, 0.90), 91.0);
        assert_eq!(nearest_rank(&sorted, 0.99), 100.0);
    }

    #[test]
    fn nearest_rank_clamps_to_last_index() {
        let sorted = vec![1.0, 2.0];
        assert_eq!(nearest_rank(&sorted, 0.99), 2.0);
    }

    #[test]
    fn nearest_rank_single_value() {
        let sorted = vec![42.0];
        assert_eq!(nearest_rank(&sorted, 0.50), 42.0);
        assert_eq!(nearest_rank(&sorted, 0.99), 42.0);
    }

    // -----------------------------------------------------------------------
    // aggregate
    // -----------------------------------------------------------------------

    #[test]
    fn aggregate_empty_is_an_error() {
        let err = aggregate(&[]).unwrap_err();
        assert!(matches!(err, ReportError::Aggregation(_)));
    }

    #[test]
    fn aggregate_three_login_samples_scenario() {
        // 3 samples, all successful, elapsed [100, 200, 300].
        let samples = vec![
            sample("Login", 0, 100.0, true),
            sample("Login", 1, 200.0, true),
            sample("Login", 2, 300.0, true),
        ];
        let (overall, labels) = aggregate(&samples).unwrap();

        let login = &labels["Login"];
        assert_eq!(login.count, 3);
        assert_eq!(login.error_count, 0);
        assert_eq!(login.error_rate, 0.0);
        assert!((login.min_ms - 100.0).abs() < 1e-9);
        assert!((login.max_ms - 300.0).abs() < 1e-9);
        assert!((login.mean_ms - 200.0).abs() < 1e-9);
        // floor(0.5 * 3) = 1 -> second smallest value.
        assert!((login.p50_ms - 200.0).abs() < 1e-9);

        assert_eq!(overall.count, 3);
        assert_eq!(overall.error_rate, 0.0);
    }

    #[test]
    fn aggregate_error_counts_per_partition() {
        let samples = vec![
            sample("Checkout", 0, 100.0, true),
            sample("Checkout", 1, 200.0, false),
        ];
        let (_, labels) = aggregate(&samples).unwrap();
        let checkout = &labels["Checkout"];
        assert_eq!(checkout.error_count, 1);
        assert!((checkout.error_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn aggregate_partition_sums_equal_overall() {
        let samples = vec![
            sample("A", 0, 10.0, true),
            sample("A", 1, 20.0, false),
            sample("B", 2, 30.0, true),
            sample("B", 3, 40.0, false),
            sample("C", 4, 50.0, true),
        ];
        let (overall, labels) = aggregate(&samples).unwrap();
        let count_sum: u64 = labels.values().map(|l| l.count).sum();
        let error_sum: u64 = labels.values().map(|l| l.error_count).sum();
        assert_eq!(count_sum, overall.count);
        assert_eq!(error_sum, overall.error_count);
    }

    #[test]
    fn aggregate_percentiles_are_monotone_and_bounded() {
        let samples: Vec<Sample> = (0..57)
            .map(|i| sample("Mixed", i, ((i * 37) % 100) as f64 + 1.0, true))
            .collect();
        let (overall, labels) = aggregate(&samples).unwrap();

        for stats in labels.values() {
            assert!(stats.p50_ms <= stats.p90_ms);
            assert!(stats.p90_ms <= stats.p95_ms);
            assert!(stats.p95_ms <= stats.p99_ms);
            assert!(stats.min_ms <= stats.p50_ms);
            assert!(stats.p99_ms <= stats.max_ms);
        }
        assert!(overall.p50_ms <= overall.p90_ms);
        assert!(overall.p99_ms <= overall.max_ms);
    }

    #[test]
    fn aggregate_label_throughput_uses_label_span() {
        // Label A spans 10 seconds with 2 samples; label B spans 2 seconds
        // with 2 samples. Their throughputs must differ.
        let samples = vec![
            sample("A", 0, 10.0, true),
            sample("A", 10, 10.0, true),
            sample("B", 4, 10.0, true),
            sample("B", 6, 10.0, true),
        ];
        let (_, labels) = aggregate(&samples).unwrap();
        assert!((labels["A"].throughput_rps - 0.2).abs() < 1e-9);
        assert!((labels["B"].throughput_rps - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_single_sample_label_has_zero_throughput() {
        // Zero span: the divide-by-zero guard substitutes 0.
        let samples = vec![sample("One", 0, 100.0, true)];
        let (_, labels) = aggregate(&samples).unwrap();
        assert_eq!(labels["One"].throughput_rps, 0.0);
    }

    #[test]
    fn aggregate_test_duration_widens_span_by_boundary_latencies() {
        // 10s of timestamp span, first sample 500ms, last sample 1500ms.
        let samples = vec![
            sample("A", 0, 500.0, true),
            sample("A", 5, 100.0, true),
            sample("A", 10, 1500.0, true),
        ];
        let (overall, _) = aggregate(&samples).unwrap();
        assert!((overall.test_duration_s - 12.0).abs() < 1e-9);
        assert!((overall.throughput_rps - 3.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_single_sample_duration_is_its_latency() {
        let samples = vec![sample("Solo", 0, 2000.0, true)];
        let (overall, _) = aggregate(&samples).unwrap();
        assert!((overall.test_duration_s - 2.0).abs() < 1e-9);
        assert!((overall.throughput_rps - 0.5).abs() < 1e-9);
    }

    #[test]
    fn aggregate_is_insensitive_to_input_order() {
        let mut forward = vec![
            sample("A", 0, 10.0, true),
            sample("A", 1, 20.0, false),
            sample("B", 2, 30.0, true),
        ];
        let (ov_a, lb_a) = aggregate(&forward).unwrap();
        forward.reverse();
        let (ov_b, lb_b) = aggregate(&forward).unwrap();

        assert_eq!(ov_a.count, ov_b.count);
        assert!((ov_a.p50_ms - ov_b.p50_ms).abs() < 1e-9);
        assert!((ov_a.test_duration_s - ov_b.test_duration_s).abs() < 1e-9);
        assert_eq!(lb_a.len(), lb_b.len());
        assert!((lb_a["A"].mean_ms - lb_b["A"].mean_ms).abs() < 1e-9);
    }

    #[test]
    fn aggregate_all_failures() {
        let samples = vec![
            sample("Broken", 0, 10.0, false),
            sample("Broken", 1, 20.0, false),
        ];
        let (overall, labels) = aggregate(&samples).unwrap();
        assert_eq!(overall.error_count, overall.count);
        assert!((labels["Broken"].error_rate - 1.0).abs() < 1e-9);
    }
}
