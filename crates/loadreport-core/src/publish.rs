use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::ReportError;

// ---------------------------------------------------------------------------
// PagePublisher
// ---------------------------------------------------------------------------

/// Publishes a rendered HTML report as a wiki page.
///
/// `upsert_page` is idempotent over the page title: an existing page is
/// updated in place with its version incremented, never duplicated.
pub trait PagePublisher {
    fn upsert_page(
        &self,
        title: &str,
        parent_id: Option<&str>,
        html: &str,
    ) -> impl std::future::Future<Output = Result<String, ReportError>> + Send;
}

// ---------------------------------------------------------------------------
// ConfluenceClient
// ---------------------------------------------------------------------------

/// Connection settings for the Confluence REST v2 API.
#[derive(Debug, Clone)]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub username: String,
    pub token: String,
    pub space_id: String,
}

pub struct ConfluenceClient {
    http: reqwest::Client,
    config: ConfluenceConfig,
}

#[derive(Debug, Deserialize)]
struct PageList {
    results: Vec<PageSummary>,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    id: String,
    version: PageVersion,
}

#[derive(Debug, Deserialize)]
struct PageVersion {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct PageCreated {
    id: String,
}

impl ConfluenceClient {
    pub fn new(config: ConfluenceConfig) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("loadreport/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn pages_url(&self) -> String {
        format!("{}/wiki/api/v2/pages", self.config.base_url.trim_end_matches('/'))
    }

    /// Look up an existing page by exact title within the configured space.
    async fn page_by_title(&self, title: &str) -> Result<Option<PageSummary>, ReportError> {
        let response = self
            .http
            .get(self.pages_url())
            .basic_auth(&self.config.username, Some(&self.config.token))
            .query(&[("title", title), ("space-id", &self.config.space_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportError::Collaborator(format!(
                "page lookup for '{title}' failed with status {}",
                response.status()
            )));
        }

        let list: PageList = response.json().await?;
        Ok(list.results.into_iter().next())
    }

    fn page_body(&self, title: &str, html: &str, parent_id: Option<&str>) -> serde_json::Value {
        let mut body = json!({
            "title": title,
            "type": "page",
            "spaceId": self.config.space_id,
            "body": {
                "storage": {
                    "value": html,
                    "representation": "storage",
                }
            }
        });
        if let Some(parent) = parent_id {
            body["ancestors"] = json!([{"id": parent}]);
        }
        body
    }
}

impl PagePublisher for ConfluenceClient {
    async fn upsert_page(
        &self,
        title: &str,
        parent_id: Option<&str>,
        html: &str,
    ) -> Result<String, ReportError> {
        let existing = self.page_by_title(title).await?;

        let page_id = match existing {
            Some(page) => {
                let mut body = self.page_body(title, html, parent_id);
                body["version"] = json!({"number": page.version.number + 1});

                let response = self
                    .http
                    .put(format!("{}/{}", self.pages_url(), page.id))
                    .basic_auth(&self.config.username, Some(&self.config.token))
                    .json(&body)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ReportError::Collaborator(format!(
                        "page update for '{title}' failed with status {}",
                        response.status()
                    )));
                }
                tracing::info!("updated existing page '{title}' to version {}", page.version.number + 1);
                page.id
            }
            None => {
                let response = self
                    .http
                    .post(self.pages_url())
                    .basic_auth(&self.config.username, Some(&self.config.token))
                    .json(&self.page_body(title, html, parent_id))
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ReportError::Collaborator(format!(
                        "page creation for '{title}' failed with status {}",
                        response.status()
                    )));
                }
                let created: PageCreated = response.json().await?;
                tracing::info!("created page '{title}' with id {}", created.id);
                created.id
            }
        };

        Ok(format!(
            "{}/wiki/pages/{page_id}",
            self.config.base_url.trim_end_matches('/')
        ))
    }
}
