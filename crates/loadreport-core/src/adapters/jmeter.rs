use chrono::{TimeZone, Utc};

use super::{ParsedSamples, SourceAdapter};
use crate::error::ReportError;
use crate::model::Sample;

// ---------------------------------------------------------------------------
// TransactionLogAdapter - comma-delimited JMeter JTL
// ---------------------------------------------------------------------------

/// Adapter for comma-delimited transaction logs (JMeter JTL).
///
/// One row is one sample: `timeStamp` is epoch milliseconds, `elapsed` is
/// milliseconds, and `success` is a literal boolean column.
#[derive(Debug, Default)]
pub struct TransactionLogAdapter;

impl TransactionLogAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for TransactionLogAdapter {
    fn parse(&self, raw: &[u8], source: &str) -> Result<ParsedSamples, ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
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
        let ts_idx = col("timeStamp")?;
        let elapsed_idx = col("elapsed")?;
        let label_idx = col("label")?;
        let success_idx = col("success")?;

        let mut samples = Vec::new();
        let mut skipped_rows = 0u64;
        let mut total_rows = 0u64;

        for (i, record) in reader.records().enumerate() {
            // Header is line 1.
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

            let parsed = parse_row(&record, ts_idx, elapsed_idx, label_idx, success_idx);
            match parsed {
                Some(sample) => samples.push(sample),
                None => {
                    tracing::warn!("skipping unparsable row at {source}:{line}");
                    skipped_rows += 1;
                }
            }
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

/// Parse one record into a sample, or `None` when a field fails to parse.
fn parse_row(
    record: &csv::StringRecord,
    ts_idx: usize,
    elapsed_idx: usize,
    label_idx: usize,
    success_idx: usize,
) -> Option<Sample> {
    let epoch_ms: i64 = record.get(ts_idx)?.parse().ok()?;
    let timestamp = Utc.timestamp_millis_opt(epoch_ms).single()?;

    let elapsed_ms: f64 = record.get(elapsed_idx)?.parse().ok()?;
    if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
        return None;
    }

    let success: bool = record.get(success_idx)?.to_ascii_lowercase().parse().ok()?;
    let label = record.get(label_idx).unwrap_or_default();

    Some(Sample::new(label, timestamp, elapsed_ms, success))
}
