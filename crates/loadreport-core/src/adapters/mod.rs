use crate::detect::FormatKind;
use crate::error::ReportError;
use crate::model::Sample;

mod jmeter;
mod k6;
mod neoload;

pub use jmeter::TransactionLogAdapter;
pub use k6::StreamingJsonAdapter;
pub use neoload::SemicolonCsvAdapter;

// ---------------------------------------------------------------------------
// SourceAdapter
// ---------------------------------------------------------------------------

/// Result of parsing one input file.
#[derive(Debug)]
pub struct ParsedSamples {
    /// Samples in file order (not required to be chronological).
    pub samples: Vec<Sample>,
    /// Rows that were skipped because a field failed to parse.
    pub skipped_rows: u64,
}

/// Parses raw input bytes into canonical samples.
///
/// Malformed rows are skipped and counted, not fatal; a file where the
/// required structure is missing or where every row fails raises a fatal
/// ingestion error with the file path attached via `source`.
pub trait SourceAdapter {
    fn parse(&self, raw: &[u8], source: &str) -> Result<ParsedSamples, ReportError>;
}

// ---------------------------------------------------------------------------
// IngestOptions / adapter_for
// ---------------------------------------------------------------------------

/// Per-format ingestion knobs.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// HTTP status tags the streaming-JSON format counts as failures.
    pub error_status_codes: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            error_status_codes: vec!["500".to_string(), "404".to_string()],
        }
    }
}

/// Select the adapter for a detected format. The format set is closed, so
/// this is a plain match rather than a plugin registry.
pub fn adapter_for(kind: FormatKind, options: &IngestOptions) -> Box<dyn SourceAdapter> {
    match kind {
        FormatKind::TransactionLog => Box::new(TransactionLogAdapter::new()),
        FormatKind::StreamingJson => {
            Box::new(StreamingJsonAdapter::new(options.error_status_codes.clone()))
        }
        FormatKind::SemicolonCsv => Box::new(SemicolonCsvAdapter::new()),
    }
}
