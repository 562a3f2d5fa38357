use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::{ParsedSamples, SourceAdapter};
use crate::error::ReportError;
use crate::model::Sample;

// ---------------------------------------------------------------------------
// SemicolonCsvAdapter - semicolon-delimited export (NeoLoad)
// ---------------------------------------------------------------------------

/// Adapter for semicolon-delimited CSV exports (NeoLoad).
///
/// `Element` is the label column and `Success` is a textual yes/no column
/// compared case-insensitively against "yes". Timestamps without an
/// explicit offset are localized to UTC; ones that already carry an offset
/// are converted, never shifted a second time.
#[derive(Debug, Default)]
pub struct SemicolonCsvAdapter;

impl SemicolonCsvAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw timestamp string to UTC.
    ///
    /// Idempotent over a later offset rendering: formatting the result in
    /// any fixed offset and parsing it again yields the same instant.
    pub fn normalize_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%z") {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        None
    }
}

impl SourceAdapter for SemicolonCsvAdapter {
    fn parse(&self, raw: &[u8], source: &str) -> Result<ParsedSamples, ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b';')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(raw);

        let headers = reader.headers()?.clone();
        let col = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ReportError::ingestion(source, format!("missing column '{name}'")))
        };
        let time_idx = col("Time")?;
        let element_idx = col("Element")?;
        let response_idx = col("Response time")?;
        let success_idx = col("Success")?;

        let mut samples = Vec::new();
        let mut skipped_rows = 0u64;
        let mut total_rows = 0u64;

        for (i, record) in reader.records().enumerate() {
            let line = i + 2;
            total_rows += 1;

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("skipping malformed row at {source}:{line}: {e}");
                    skipped_rows += 1;
                    continue;
                }
            };

            let timestamp = record
                .get(time_idx)
                .and_then(|t| self.normalize_timestamp(t));
            let elapsed_ms = record
                .get(response_idx)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0);

            let (Some(timestamp), Some(elapsed_ms)) = (timestamp, elapsed_ms) else {
                tracing::warn!("skipping unparsable row at {source}:{line}");
                skipped_rows += 1;
                continue;
            };

            let success = record
                .get(success_idx)
                .is_some_and(|s| s.eq_ignore_ascii_case("yes"));
            let label = record.get(element_idx).unwrap_or_default();

            samples.push(Sample::new(label, timestamp, elapsed_ms, success));
        }

        if samples.is_empty() && total_rows > 0 {
            return Err(ReportError::ingestion(
                source,
                format!("all {total_rows} rows failed to parse"),
            ));
        }

        Ok(ParsedSamples {
            samples,
            skipped_rows,
        })
    }
}
