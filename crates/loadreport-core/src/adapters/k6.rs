use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ParsedSamples, SourceAdapter};
use crate::detect::DURATION_METRIC;
use crate::error::ReportError;
use crate::model::Sample;

// ---------------------------------------------------------------------------
// StreamingJsonAdapter - flat array of tagged time-series events (k6)
// ---------------------------------------------------------------------------

/// Adapter for streaming-JSON result files.
///
/// The file holds a flat array of tagged events; only events of type
/// `"Point"` carrying the duration metric become samples. Success is
/// derived from the HTTP status tag: a status in the configured error set
/// counts as a failure, anything else (including an absent tag) as a pass.
#[derive(Debug)]
pub struct StreamingJsonAdapter {
    error_status_codes: Vec<String>,
}

impl StreamingJsonAdapter {
    pub fn new(error_status_codes: Vec<String>) -> Self {
        Self { error_status_codes }
    }

    fn is_success(&self, status: Option<&str>) -> bool {
        match status {
            Some(code) => !self.error_status_codes.iter().any(|c| c == code),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamDocument {
    metrics: Vec<StreamEvent>,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    metric: String,
    data: Option<PointData>,
}

#[derive(Debug, Deserialize)]
struct PointData {
    time: Option<String>,
    value: Option<f64>,
    #[serde(default)]
    tags: PointTags,
}

#[derive(Debug, Default, Deserialize)]
struct PointTags {
    name: Option<String>,
    status: Option<String>,
}

impl SourceAdapter for StreamingJsonAdapter {
    fn parse(&self, raw: &[u8], source: &str) -> Result<ParsedSamples, ReportError> {
        let document: StreamDocument = serde_json::from_slice(raw)
            .map_err(|e| ReportError::ingestion(source, format!("invalid JSON document: {e}")))?;

        let mut samples = Vec::new();
        let mut skipped_rows = 0u64;

        for (i, event) in document.metrics.iter().enumerate() {
            if event.kind != "Point" || event.metric != DURATION_METRIC {
                continue;
            }

            match point_to_sample(event, |s| self.is_success(s)) {
                Some(sample) => samples.push(sample),
                None => {
                    tracing::warn!("skipping malformed duration point at {source} entry {i}");
                    skipped_rows += 1;
                }
            }
        }

        Ok(ParsedSamples {
            samples,
            skipped_rows,
        })
    }
}

/// Convert one duration point into a sample, or `None` when its timestamp
/// or value cannot be parsed.
fn point_to_sample(event: &StreamEvent, is_success: impl Fn(Option<&str>) -> bool) -> Option<Sample> {
    let data = event.data.as_ref()?;
    let elapsed_ms = data.value?;
    if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
        return None;
    }

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(data.time.as_deref()?)
        .ok()?
        .with_timezone(&Utc);

    let label = data.tags.name.as_deref().unwrap_or("Unknown");
    let success = is_success(data.tags.status.as_deref());

    Some(Sample::new(label, timestamp, elapsed_ms, success))
}
