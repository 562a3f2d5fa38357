use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use loadreport_core::detect::FormatKind;
use loadreport_core::enrich::{OllamaClient, OllamaConfig};
use loadreport_core::model::TestMetadata;
use loadreport_core::persist::save_reports;
use loadreport_core::pipeline::{Pipeline, PipelineConfig};
use loadreport_core::publish::{ConfluenceClient, ConfluenceConfig, PagePublisher};
use loadreport_core::ReportError;

/// Process load-test results into HTML, JSON, and text reports.
#[derive(Debug, Parser)]
#[command(name = "loadreport", version)]
struct Args {
    /// Path to the raw results file.
    #[arg(long)]
    input_file: PathBuf,

    /// Test name used in report headers and the published page title.
    #[arg(long)]
    test_name: String,

    /// Environment the test ran against.
    #[arg(long)]
    environment: String,

    /// Source format. Auto-detected from the file when omitted.
    #[arg(long, value_enum)]
    processor: Option<ProcessorKind>,

    /// Directory the report files are written to.
    #[arg(long, default_value = "reports")]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProcessorKind {
    Jmeter,
    K6,
    Neoload,
}

impl From<ProcessorKind> for FormatKind {
    fn from(kind: ProcessorKind) -> Self {
        match kind {
            ProcessorKind::Jmeter => FormatKind::TransactionLog,
            ProcessorKind::K6 => FormatKind::StreamingJson,
            ProcessorKind::Neoload => FormatKind::SemicolonCsv,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ReportError> {
    let metadata = TestMetadata::new(&args.test_name, &args.environment);
    let pipeline = Pipeline::new(PipelineConfig::default());

    let output = match args.processor {
        Some(kind) => pipeline.run_with_format(&args.input_file, kind.into(), &metadata)?,
        None => pipeline.run(&args.input_file, &metadata)?,
    };

    info!(
        "processed {} samples across {} transactions ({} rows skipped)",
        output.overall.count,
        output.labels.len(),
        output.skipped_rows
    );

    println!("{}", output.report.text);

    let saved = save_reports(&output.report, &args.output_dir, metadata.generated_at).await?;
    info!("JSON report saved to {}", saved.json_path.display());

    let ollama = OllamaClient::new(ollama_config_from_env());
    if ollama.is_enabled() {
        let narrative = ollama.summarize(&output.report.json).await;
        println!("\nAnalysis:\n{narrative}");
    }

    if let Some((config, parent_id)) = confluence_config_from_env() {
        let title = format!(
            "{} - {} - {}",
            args.test_name,
            args.environment,
            metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let client = ConfluenceClient::new(config)?;
        let url = client
            .upsert_page(&title, parent_id.as_deref(), &output.report.html)
            .await?;
        info!("published report page: {url}");
    }

    Ok(())
}

/// Publishing runs only when every required Confluence variable is set.
fn confluence_config_from_env() -> Option<(ConfluenceConfig, Option<String>)> {
    let config = ConfluenceConfig {
        base_url: std::env::var("CONFLUENCE_URL").ok()?,
        username: std::env::var("CONFLUENCE_USERNAME").ok()?,
        token: std::env::var("CONFLUENCE_TOKEN").ok()?,
        space_id: std::env::var("CONFLUENCE_SPACE_ID").ok()?,
    };
    let parent_id = std::env::var("CONFLUENCE_PARENT_PAGE_ID").ok();
    Some((config, parent_id))
}

fn ollama_config_from_env() -> OllamaConfig {
    let defaults = OllamaConfig::default();
    OllamaConfig {
        base_url: std::env::var("OLLAMA_URL").unwrap_or(defaults.base_url),
        model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
        enabled: std::env::var("USE_OLLAMA")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }
}
