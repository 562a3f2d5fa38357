use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

// ---------------------------------------------------------------------------
// FormatKind
// ---------------------------------------------------------------------------

/// The three source formats the pipeline can ingest.
///
/// A closed set by design; an unrecognizable file is a
/// [`ReportError::Detection`], never a guessed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// Comma-delimited transaction log (JMeter JTL).
    TransactionLog,
    /// Flat JSON array of tagged time-series events (k6).
    StreamingJson,
    /// Semicolon-delimited CSV export (NeoLoad).
    SemicolonCsv,
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatKind::TransactionLog => "transaction_log",
            FormatKind::StreamingJson => "streaming_json",
            FormatKind::SemicolonCsv => "semicolon_csv",
        };
        write!(f, "{name}")
    }
}

/// Header columns a transaction log must carry.
const TRANSACTION_LOG_COLUMNS: [&str; 5] =
    ["timeStamp", "elapsed", "label", "responseCode", "success"];

/// Header columns a semicolon CSV must carry.
const SEMICOLON_CSV_COLUMNS: [&str; 4] = ["Time", "Element", "Response time", "Success"];

/// The only metric name whose points become samples in streaming JSON.
pub const DURATION_METRIC: &str = "http_req_duration";

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

/// Classify a results file by extension and header/structure.
///
/// Branches on the file extension first (`.jtl`/`.csv` are tabular,
/// `.json` is streaming), then confirms by the required column set or
/// event structure. Deterministic and total: every input yields exactly
/// one format or a descriptive [`ReportError::Detection`].
pub fn detect(path: impl AsRef<Path>) -> Result<FormatKind, ReportError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReportError::Detection(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jtl" | "csv" => detect_tabular(path),
        "json" => detect_streaming(path),
        other => Err(ReportError::Detection(format!(
            "unsupported file extension '.{other}' for {}",
            path.display()
        ))),
    }
}

/// Classify a tabular file by its header row.
///
/// The delimiter disambiguates the two tabular formats even when the
/// extensions collide: a transaction log is comma-delimited while a
/// semicolon CSV uses `;`.
fn detect_tabular(path: &Path) -> Result<FormatKind, ReportError> {
    let content = read_text(path)?;
    let header = content.lines().next().ok_or_else(|| {
        ReportError::Detection(format!("empty file: {}", path.display()))
    })?;

    let comma_cols: Vec<&str> = header.split(',').map(str::trim).collect();
    if TRANSACTION_LOG_COLUMNS
        .iter()
        .all(|c| comma_cols.contains(c))
    {
        return Ok(FormatKind::TransactionLog);
    }

    let semi_cols: Vec<&str> = header.split(';').map(str::trim).collect();
    if SEMICOLON_CSV_COLUMNS.iter().all(|c| semi_cols.contains(c)) {
        return Ok(FormatKind::SemicolonCsv);
    }

    Err(ReportError::Detection(format!(
        "header of {} matches neither the transaction-log nor the semicolon-CSV column set",
        path.display()
    )))
}

/// Read the candidate file, folding read failures (including non-UTF-8
/// content) into the detection taxonomy.
fn read_text(path: &Path) -> Result<String, ReportError> {
    std::fs::read_to_string(path).map_err(|e| {
        ReportError::Detection(format!("failed to read {}: {e}", path.display()))
    })
}

/// Classify a `.json` file by looking for at least one duration point.
fn detect_streaming(path: &Path) -> Result<FormatKind, ReportError> {
    let content = read_text(path)?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        ReportError::Detection(format!("{} is not valid JSON: {e}", path.display()))
    })?;

    let metrics = value
        .get("metrics")
        .and_then(|m| m.as_array())
        .ok_or_else(|| {
            ReportError::Detection(format!(
                "{} has no 'metrics' array",
                path.display()
            ))
        })?;

    let has_duration_point = metrics.iter().any(|m| {
        m.get("type").and_then(|t| t.as_str()) == Some("Point")
            && m.get("metric").and_then(|t| t.as_str()) == Some(DURATION_METRIC)
    });

    if has_duration_point {
        Ok(FormatKind::StreamingJson)
    } else {
        Err(ReportError::Detection(format!(
            "{} contains no '{DURATION_METRIC}' point events",
            path.display()
        )))
    }
}
