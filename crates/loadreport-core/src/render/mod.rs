use std::collections::BTreeMap;

use chrono::{FixedOffset, SecondsFormat};

use crate::model::{LabelStats, OverallStats, TestMetadata};

mod html;
mod json;
mod text;

pub use html::render_html;
pub use json::render_json;
pub use text::render_text;

/// Synthetic label for the pinned summary row aggregating every sample.
pub const ALL_TRANSACTIONS: &str = "ALL TRANSACTIONS";

// ---------------------------------------------------------------------------
// ChartSet
// ---------------------------------------------------------------------------

/// Optional pre-rendered chart images supplied to the HTML renderer.
///
/// Chart rendering itself lives outside the pipeline; the renderer only
/// inlines whatever PNG bytes it is handed as base64 data URIs.
#[derive(Debug, Clone, Default)]
pub struct ChartSet {
    pub response_time_png: Option<Vec<u8>>,
    pub throughput_png: Option<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Shared row shape
// ---------------------------------------------------------------------------

/// One display row of the metrics table, shared by the HTML and text
/// renderers so both emit identical numbers.
pub(crate) struct MetricRow<'a> {
    pub label: &'a str,
    pub count: u64,
    pub error_count: u64,
    pub error_rate_pct: f64,
    pub throughput_rps: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl<'a> MetricRow<'a> {
    fn from_label(label: &'a str, stats: &LabelStats) -> Self {
        Self {
            label,
            count: stats.count,
            error_count: stats.error_count,
            error_rate_pct: stats.error_rate * 100.0,
            throughput_rps: stats.throughput_rps,
            min_ms: stats.min_ms,
            max_ms: stats.max_ms,
            mean_ms: stats.mean_ms,
            p50_ms: stats.p50_ms,
            p90_ms: stats.p90_ms,
            p95_ms: stats.p95_ms,
            p99_ms: stats.p99_ms,
        }
    }

    fn from_overall(overall: &OverallStats) -> Self {
        Self {
            label: ALL_TRANSACTIONS,
            count: overall.count,
            error_count: overall.error_count,
            error_rate_pct: overall.error_rate * 100.0,
            throughput_rps: overall.throughput_rps,
            min_ms: overall.min_ms,
            max_ms: overall.max_ms,
            mean_ms: overall.mean_ms,
            p50_ms: overall.p50_ms,
            p90_ms: overall.p90_ms,
            p95_ms: overall.p95_ms,
            p99_ms: overall.p99_ms,
        }
    }
}

/// Display rows in the fixed order every renderer uses: the summary row
/// pinned first, then labels alphabetically.
pub(crate) fn metric_rows<'a>(
    overall: &'a OverallStats,
    labels: &'a BTreeMap<String, LabelStats>,
) -> Vec<MetricRow<'a>> {
    let mut rows = vec![MetricRow::from_overall(overall)];
    rows.extend(
        labels
            .iter()
            .map(|(label, stats)| MetricRow::from_label(label, stats)),
    );
    rows
}

/// Format the generation timestamp in the configured display offset. The
/// JSON report keeps the canonical UTC instant; only the human-facing
/// renderers localize.
pub(crate) fn format_generated(metadata: &TestMetadata, display_offset: FixedOffset) -> String {
    metadata
        .generated_at
        .with_timezone(&display_offset)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::model::TestMetadata;
    use chrono::TimeZone;

    pub fn label_stats(count: u64, errors: u64, base_ms: f64) -> LabelStats {
        LabelStats {
            count,
            error_count: errors,
            error_rate: if count > 0 { errors as f64 / count as f64 } else { 0.0 },
            min_ms: base_ms,
            max_ms: base_ms * 4.0,
            mean_ms: base_ms * 2.0,
            p50_ms: base_ms * 1.5,
            p90_ms: base_ms * 3.0,
            p95_ms: base_ms * 3.5,
            p99_ms: base_ms * 4.0,
            throughput_rps: 2.5,
        }
    }

    pub fn overall_stats() -> OverallStats {
        OverallStats {
            count: 5,
            error_count: 1,
            error_rate: 0.2,
            min_ms: 50.0,
            max_ms: 400.0,
            mean_ms: 175.5,
            p50_ms: 150.0,
            p90_ms: 350.0,
            p95_ms: 380.0,
            p99_ms: 400.0,
            throughput_rps: 0.5,
            test_duration_s: 10.0,
        }
    }

    pub fn labels() -> BTreeMap<String, LabelStats> {
        let mut map = BTreeMap::new();
        map.insert("Checkout".to_string(), label_stats(2, 1, 100.0));
        map.insert("Login".to_string(), label_stats(3, 0, 50.0));
        map
    }

    pub fn metadata() -> TestMetadata {
        TestMetadata {
            test_name: "Nightly Soak".to_string(),
            environment: "staging".to_string(),
            generated_at: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }
}
