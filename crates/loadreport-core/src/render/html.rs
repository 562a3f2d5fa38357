use std::collections::BTreeMap;

use base64::Engine;
use chrono::FixedOffset;

use super::{format_generated, html_escape, metric_rows, ChartSet, MetricRow};
use crate::model::{LabelStats, OverallStats, TestMetadata};

// ---------------------------------------------------------------------------
// HTML report
// ---------------------------------------------------------------------------

/// Render a self-contained HTML report.
///
/// Pure function of the statistics and metadata: no I/O, no shared state.
/// The metrics table carries one row per label plus the pinned summary
/// row, styled for direct embedding in a Confluence storage-format page.
/// Supplied chart images are inlined as base64 data URIs, and the
/// generation timestamp is shown in `display_offset`.
pub fn render_html(
    overall: &OverallStats,
    labels: &BTreeMap<String, LabelStats>,
    metadata: &TestMetadata,
    charts: &ChartSet,
    display_offset: FixedOffset,
) -> String {
    let rows = metric_rows(overall, labels);
    let body_rows: String = rows.iter().map(table_row).collect::<Vec<_>>().join("\n");

    let charts_html = [
        ("Response Time Over Time", &charts.response_time_png),
        ("Throughput Over Time", &charts.throughput_png),
    ]
    .iter()
    .filter_map(|(title, png)| {
        png.as_ref().map(|bytes| {
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            format!(
                "<h2>{title}</h2>\n<img src=\"data:image/png;base64,{encoded}\" \
                 alt=\"{title}\" style=\"width: 100%; max-width: 1200px;\">"
            )
        })
    })
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Performance Report - {test_name}</title>
</head>
<body>
<h1>{test_name}</h1>
<p>
  <strong>Environment:</strong> {environment} &nbsp;
  <strong>Generated:</strong> {generated} &nbsp;
  <strong>Test Duration:</strong> {duration:.2}s
</p>

<h2>Summary</h2>
<ul>
  <li>Total Requests: {total}</li>
  <li>Errors: {errors} ({error_rate:.2}%)</li>
  <li>Throughput: {rps:.2} req/s</li>
  <li>Response Time (ms): min {min:.2} / avg {mean:.2} / max {max:.2}</li>
  <li>Percentiles (ms): P50 {p50:.2} / P90 {p90:.2} / P95 {p95:.2} / P99 {p99:.2}</li>
</ul>

<h2>Transactions</h2>
<table class="confluenceTable" style="width: 100%; border-collapse: collapse; margin: 10px 0;">
<tbody>
<tr style="background-color: #f0f0f0; font-weight: bold;">
{header_cells}
</tr>
{body_rows}
</tbody>
</table>
{charts_html}
</body>
</html>
"#,
        test_name = html_escape(&metadata.test_name),
        environment = html_escape(&metadata.environment),
        generated = format_generated(metadata, display_offset),
        duration = overall.test_duration_s,
        total = overall.count,
        errors = overall.error_count,
        error_rate = overall.error_rate * 100.0,
        rps = overall.throughput_rps,
        min = overall.min_ms,
        mean = overall.mean_ms,
        max = overall.max_ms,
        p50 = overall.p50_ms,
        p90 = overall.p90_ms,
        p95 = overall.p95_ms,
        p99 = overall.p99_ms,
        header_cells = header_cells(),
        body_rows = body_rows,
        charts_html = charts_html,
    )
}

const COLUMNS: [&str; 12] = [
    "Transaction",
    "Count",
    "Errors",
    "Error Rate (%)",
    "Throughput (req/sec)",
    "Min (ms)",
    "Max (ms)",
    "Avg (ms)",
    "P50 (ms)",
    "P90 (ms)",
    "P95 (ms)",
    "P99 (ms)",
];

fn header_cells() -> String {
    COLUMNS
        .iter()
        .map(|c| {
            format!(
                "<th class=\"confluenceTh\" style=\"padding: 8px; border: 1px solid #ddd; text-align: left;\">{c}</th>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_row(row: &MetricRow<'_>) -> String {
    let style = if row.label == super::ALL_TRANSACTIONS {
        " style=\"font-weight: bold;\""
    } else {
        ""
    };
    let cells = [
        html_escape(row.label),
        row.count.to_string(),
        row.error_count.to_string(),
        format!("{:.2}%", row.error_rate_pct),
        format!("{:.2}", row.throughput_rps),
        format!("{:.2}", row.min_ms),
        format!("{:.2}", row.max_ms),
        format!("{:.2}", row.mean_ms),
        format!("{:.2}", row.p50_ms),
        format!("{:.2}", row.p90_ms),
        format!("{:.2}", row.p95_ms),
        format!("{:.2}", row.p99_ms),
    ]
    .iter()
    .map(|v| {
        format!("<td class=\"confluenceTd\" style=\"padding: 8px; border: 1px solid #ddd;\">{v}</td>")
    })
    .collect::<Vec<_>>()
    .join("");
    format!("<tr{style}>{cells}</tr>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;
    use chrono::{Offset, Utc};

    fn render() -> String {
        render_html(
            &fixtures::overall_stats(),
            &fixtures::labels(),
            &fixtures::metadata(),
            &ChartSet::default(),
            Utc.fix(),
        )
    }

    #[test]
    fn render_html_is_a_complete_document() {
        let html = render();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Nightly Soak"));
        assert!(html.contains("staging"));
    }

    #[test]
    fn render_html_pins_all_transactions_row_first() {
        let html = render();
        let all_pos = html.find("ALL TRANSACTIONS").expect("summary row");
        let checkout_pos = html.find("Checkout").expect("label row");
        let login_pos = html.find("Login").expect("label row");
        assert!(all_pos < checkout_pos);
        assert!(checkout_pos < login_pos);
    }

    #[test]
    fn render_html_has_one_row_per_label_plus_summary() {
        let html = render();
        // Header row + summary row + two label rows.
        assert_eq!(html.matches("<tr").count(), 4);
    }

    #[test]
    fn render_html_escapes_label_and_metadata() {
        let mut labels = fixtures::labels();
        let stats = labels.remove("Login").unwrap();
        labels.insert("Login <POST> & Redirect".to_string(), stats);
        let html = render_html(
            &fixtures::overall_stats(),
            &labels,
            &fixtures::metadata(),
            &ChartSet::default(),
            Utc.fix(),
        );
        assert!(html.contains("Login &lt;POST&gt; &amp; Redirect"));
    }

    #[test]
    fn render_html_inlines_supplied_chart_as_data_uri() {
        let charts = ChartSet {
            response_time_png: Some(vec![0x89, 0x50, 0x4e, 0x47]),
            throughput_png: None,
        };
        let html = render_html(
            &fixtures::overall_stats(),
            &fixtures::labels(),
            &fixtures::metadata(),
            &charts,
            Utc.fix(),
        );
        assert!(html.contains("data:image/png;base64,iVBORw=="));
        assert!(html.contains("Response Time Over Time"));
        assert!(!html.contains("Throughput Over Time"));
    }

    #[test]
    fn render_html_without_charts_has_no_images() {
        let html = render();
        assert!(!html.contains("<img"));
    }

    #[test]
    fn render_html_shows_generated_timestamp_in_display_offset() {
        // Fixture generated_at is 12:00:00 UTC; at -05:00 it reads 07:00.
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let html = render_html(
            &fixtures::overall_stats(),
            &fixtures::labels(),
            &fixtures::metadata(),
            &ChartSet::default(),
            offset,
        );
        assert!(html.contains("2024-05-01T07:00:00-05:00"));
    }

    #[test]
    fn render_html_is_deterministic() {
        assert_eq!(render(), render());
    }
}
