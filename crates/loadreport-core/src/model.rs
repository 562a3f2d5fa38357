use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sample - canonical observation, independent of source format
// ---------------------------------------------------------------------------

/// One observed transaction execution, normalized from any source format.
///
/// Immutable once constructed. Rows whose latency cannot be parsed are
/// dropped at ingestion rather than defaulted to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Logical transaction/element name. Never empty; sources that omit
    /// it yield "Unknown".
    pub label: String,
    /// Wall-clock time the sample was recorded.
    pub timestamp: DateTime<Utc>,
    /// Observed latency in milliseconds, >= 0.
    pub elapsed_ms: f64,
    /// Outcome, resolved per the source format's own error convention.
    pub success: bool,
}

impl Sample {
    pub fn new(
        label: impl Into<String>,
        timestamp: DateTime<Utc>,
        elapsed_ms: f64,
        success: bool,
    ) -> Self {
        let label = label.into();
        Self {
            label: if label.is_empty() {
                "Unknown".to_string()
            } else {
                label
            },
            timestamp,
            elapsed_ms,
            success,
        }
    }
}

// ---------------------------------------------------------------------------
// LabelStats / OverallStats
// ---------------------------------------------------------------------------

/// Aggregate statistics for one label's samples.
///
/// A label with zero samples is never emitted, so every latency field is
/// always defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LabelStats {
    pub count: u64,
    pub error_count: u64,
    /// Fraction of failed samples, in [0, 1].
    pub error_rate: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Count divided by this label's own observed time span, not the
    /// overall test span.
    pub throughput_rps: f64,
}

/// Aggregate statistics across all samples of a run.
///
/// Constructed once per processing run from the fully materialized sample
/// sequence; read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OverallStats {
    pub count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub throughput_rps: f64,
    /// Span between the earliest and latest sample timestamps, widened by
    /// the boundary samples' own latencies (see [`crate::stats`]).
    pub test_duration_s: f64,
}

// ---------------------------------------------------------------------------
// TestMetadata / Report
// ---------------------------------------------------------------------------

/// Run-level metadata attached to every rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestMetadata {
    pub test_name: String,
    pub environment: String,
    pub generated_at: DateTime<Utc>,
}

impl TestMetadata {
    pub fn new(test_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            environment: environment.into(),
            generated_at: Utc::now(),
        }
    }
}

/// The rendered artifact bundle. Each member is derived independently from
/// the same statistics; regenerating one never touches the others.
#[derive(Debug, Clone)]
pub struct Report {
    pub html: String,
    pub json: serde_json::Value,
    pub text: String,
}
