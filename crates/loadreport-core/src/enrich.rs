use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

/// Returned whenever narrative analysis is disabled or unavailable. The
/// report is complete without it; enrichment never fails the run.
pub const ANALYSIS_UNAVAILABLE: &str = "Unable to generate analysis at this time.";

/// Returned when the client is constructed disabled.
pub const ANALYSIS_DISABLED: &str =
    "LLM analysis is disabled. Enable it with USE_OLLAMA=true.";

// ---------------------------------------------------------------------------
// OllamaClient
// ---------------------------------------------------------------------------

/// Settings for the narrative summarizer.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub enabled: bool,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            enabled: false,
        }
    }
}

/// Client for an Ollama-compatible generation endpoint.
///
/// Disabled by default. Every failure path degrades to a fixed
/// placeholder string so the core pipeline's output stays valid.
pub struct OllamaClient {
    http: reqwest::Client,
    config: OllamaConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Produce a narrative summary of the JSON report.
    pub async fn summarize(&self, json_report: &serde_json::Value) -> String {
        if !self.config.enabled {
            return ANALYSIS_DISABLED.to_string();
        }

        match self.generate(json_report).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("narrative enrichment failed: {e}");
                ANALYSIS_UNAVAILABLE.to_string()
            }
        }
    }

    async fn generate(
        &self,
        json_report: &serde_json::Value,
    ) -> Result<String, crate::error::ReportError> {
        let prompt = build_prompt(json_report)?;
        let url = format!(
            "{}/api/generate",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .json(&json!({
                "model": self.config.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::error::ReportError::Collaborator(format!(
                "generation request failed with status {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body
            .response
            .unwrap_or_else(|| ANALYSIS_UNAVAILABLE.to_string()))
    }
}

fn build_prompt(json_report: &serde_json::Value) -> Result<String, serde_json::Error> {
    Ok(format!(
        "You are a performance testing expert. Analyze these load-test \
         results and summarize: overall performance (duration, totals, \
         throughput, error rate), response-time percentiles, and any \
         bottlenecks worth investigating. Keep it focused on actionable \
         insights.\n\nTest Results:\n{}",
        serde_json::to_string_pretty(json_report)?
    ))
}
