use std::collections::BTreeMap;
use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};

use crate::adapters::{adapter_for, IngestOptions};
use crate::detect::{detect, FormatKind};
use crate::error::ReportError;
use crate::model::{LabelStats, OverallStats, Report, TestMetadata};
use crate::render::{render_html, render_json, render_text, ChartSet};
use crate::stats::aggregate;

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Explicit configuration for one pipeline instance.
///
/// Passed in at construction rather than read from ambient globals, so
/// multiple pipelines in one process cannot interfere.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// HTTP status tags counted as failures by the streaming-JSON format.
    pub error_status_codes: Vec<String>,
    /// Offset the HTML and text renderers show the generation timestamp
    /// in. The JSON report always keeps canonical UTC.
    pub display_offset: FixedOffset,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            error_status_codes: IngestOptions::default().error_status_codes,
            display_offset: Utc.fix(),
        }
    }
}

impl PipelineConfig {
    fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            error_status_codes: self.error_status_codes.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything one processing run produces.
///
/// Owned by the caller; the pipeline keeps no state across runs, so
/// concurrent runs over different files are independent.
#[derive(Debug)]
pub struct PipelineOutput {
    pub format: FormatKind,
    pub overall: OverallStats,
    pub labels: BTreeMap<String, LabelStats>,
    pub report: Report,
    /// Rows dropped during ingestion because a field failed to parse.
    pub skipped_rows: u64,
}

/// Wires detector, adapter, aggregator, and renderers into one batch run.
/// Persistence, publishing, and enrichment happen strictly after `run`
/// returns and are driven by the caller.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Detect the input format, then process the file.
    pub fn run(
        &self,
        path: impl AsRef<Path>,
        metadata: &TestMetadata,
    ) -> Result<PipelineOutput, ReportError> {
        let path = path.as_ref();
        let format = detect(path)?;
        tracing::info!("detected {format} input at {}", path.display());
        self.run_with_format(path, format, metadata)
    }

    /// Process a file whose format the caller already knows.
    pub fn run_with_format(
        &self,
        path: impl AsRef<Path>,
        format: FormatKind,
        metadata: &TestMetadata,
    ) -> Result<PipelineOutput, ReportError> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;

        let adapter = adapter_for(format, &self.config.ingest_options());
        let parsed = adapter.parse(&raw, &path.display().to_string())?;
        if parsed.skipped_rows > 0 {
            tracing::warn!(
                "{} rows skipped while ingesting {}",
                parsed.skipped_rows,
                path.display()
            );
        }
        tracing::info!(
            "ingested {} samples from {}",
            parsed.samples.len(),
            path.display()
        );

        let (overall, labels) = aggregate(&parsed.samples)?;

        let report = Report {
            html: render_html(
                &overall,
                &labels,
                metadata,
                &ChartSet::default(),
                self.config.display_offset,
            ),
            json: render_json(&overall, &labels, metadata)?,
            text: render_text(&overall, &labels, metadata, self.config.display_offset),
        };

        Ok(PipelineOutput {
            format,
            overall,
            labels,
            report,
            skipped_rows: parsed.skipped_rows,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
