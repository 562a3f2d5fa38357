use std::collections::BTreeMap;

use chrono::FixedOffset;

use super::{format_generated, metric_rows, MetricRow};
use crate::model::{LabelStats, OverallStats, TestMetadata};

// Column widths are renderer constants, not derived from the data, so an
// oversized label truncates instead of reflowing the table.
const LABEL_WIDTH: usize = 32;
const COUNT_WIDTH: usize = 8;
const RATE_WIDTH: usize = 10;
const MS_WIDTH: usize = 10;

/// Render the fixed-width console report, with the generation timestamp
/// shown in `display_offset`.
pub fn render_text(
    overall: &OverallStats,
    labels: &BTreeMap<String, LabelStats>,
    metadata: &TestMetadata,
    display_offset: FixedOffset,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Test: {}\n", metadata.test_name));
    out.push_str(&format!("Environment: {}\n", metadata.environment));
    out.push_str(&format!(
        "Generated: {}\n",
        format_generated(metadata, display_offset)
    ));
    out.push_str(&format!("Duration: {:.2} seconds\n", overall.test_duration_s));
    out.push_str(&format!(
        "Throughput: {:.2} transactions/sec\n\n",
        overall.throughput_rps
    ));

    out.push_str(&header_line());
    out.push_str(&separator_line());
    for row in metric_rows(overall, labels) {
        out.push_str(&data_line(&row));
    }

    out
}

fn header_line() -> String {
    format!(
        "{:<label$} {:>count$} {:>count$} {:>rate$} {:>rate$} {:>ms$} {:>ms$} {:>ms$} {:>ms$} {:>ms$} {:>ms$} {:>ms$}\n",
        "Transaction",
        "Count",
        "Errors",
        "Err %",
        "RPS",
        "Min",
        "Max",
        "Avg",
        "P50",
        "P90",
        "P95",
        "P99",
        label = LABEL_WIDTH,
        count = COUNT_WIDTH,
        rate = RATE_WIDTH,
        ms = MS_WIDTH,
    )
}

fn separator_line() -> String {
    let width = LABEL_WIDTH + COUNT_WIDTH * 2 + RATE_WIDTH * 2 + MS_WIDTH * 7 + 11;
    format!("{}\n", "-".repeat(width))
}

fn data_line(row: &MetricRow<'_>) -> String {
    format!(
        "{:<label$} {:>count$} {:>count$} {:>rate$} {:>rate$} {:>ms$} {:>ms$} {:>ms$} {:>ms$} {:>ms$} {:>ms$} {:>ms$}\n",
        truncate(row.label, LABEL_WIDTH),
        row.count,
        row.error_count,
        format!("{:.2}%", row.error_rate_pct),
        format!("{:.2}", row.throughput_rps),
        format!("{:.2}", row.min_ms),
        format!("{:.2}", row.max_ms),
        format!("{:.2}", row.mean_ms),
        format!("{:.2}", row.p50_ms),
        format!("{:.2}", row.p90_ms),
        format!("{:.2}", row.p95_ms),
        format!("{:.2}", row.p99_ms),
        label = LABEL_WIDTH,
        count = COUNT_WIDTH,
        rate = RATE_WIDTH,
        ms = MS_WIDTH,
    )
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let kept: String = label.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
