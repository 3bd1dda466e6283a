//! reqwest implementation of [`TemplateApi`].
//!
//! Every call authenticates with `Authorization: Token <token>`. JSON calls
//! honor the optional request timeout; the execution stream never does,
//! since it stays open for as long as the generation runs.

use promptify_core::{AppError, AppResult};
use promptify_template::{Template, TemplateSummary};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::client::{Execution, ExecutionRequest, ExecutionStream, TemplateApi};
use crate::sse::event_stream;

/// Catalog query for templates visible to API users.
const CATALOG_PATH: &str = "/meta/templates?status=published&is_internal=false";

/// The catalog endpoint answers either with a bare array or with a page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogPage<T> {
    List(Vec<T>),
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
}

/// HTTP client for the Promptify API.
#[derive(Clone)]
pub struct HttpTemplateApi {
    /// Base URL without trailing slash, e.g. `https://api.promptify.com/api`
    base_url: String,

    token: String,

    /// Timeout for JSON requests
    timeout: Option<Duration>,

    client: reqwest::Client,
}

impl std::fmt::Debug for HttpTemplateApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTemplateApi")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpTemplateApi {
    /// Create a client for `base_url` authenticating with `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("promptify-runner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: None,
            client,
        })
    }

    /// Apply a timeout to every non-streaming request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Token {}", self.token))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        tracing::debug!("GET {}", url);

        let mut request = self
            .authorized(self.client.get(url))
            .header(ACCEPT, "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Http(format!(
                "Promptify API error ({}) for {}: {}",
                status, url, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(format!("Failed to read response from {}: {}", url, e)))?;

        serde_json::from_str(&body).map_err(|e| {
            AppError::Serialization(format!("Failed to parse response from {}: {}", url, e))
        })
    }
}

#[async_trait::async_trait]
impl TemplateApi for HttpTemplateApi {
    async fn list_templates(&self) -> AppResult<Vec<TemplateSummary>> {
        let mut templates = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.url(CATALOG_PATH));

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!("Catalog pagination loops back to {}", url);
                break;
            }

            match self.get_json::<CatalogPage<TemplateSummary>>(&url).await? {
                CatalogPage::List(page) => templates.extend(page),
                CatalogPage::Paginated {
                    results,
                    next: following,
                } => {
                    templates.extend(results);
                    next = following;
                }
            }
        }

        tracing::debug!("Fetched {} templates", templates.len());
        Ok(templates)
    }

    async fn get_template(&self, template_id: u64) -> AppResult<Template> {
        let template: Template = self
            .get_json(&self.url(&format!("/meta/templates/{}", template_id)))
            .await?;
        tracing::debug!(
            "Loaded template {} ({} prompts)",
            template.title,
            template.prompts.len()
        );
        Ok(template)
    }

    async fn open_execution(
        &self,
        template_id: u64,
        batch: &[ExecutionRequest],
    ) -> AppResult<ExecutionStream> {
        let url = self.url(&format!("/meta/templates/{}/execute", template_id));
        tracing::debug!("POST {} ({} prompts)", url, batch.len());

        let response = self
            .authorized(self.client.post(&url))
            .header(ACCEPT, "text/event-stream")
            .json(batch)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Failed to open execution stream: {}", e)))?;

        let status = response.status();
        Ok(ExecutionStream {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown status").to_string(),
            events: event_stream(response.bytes_stream()),
        })
    }

    async fn get_execution(&self, execution_id: u64) -> AppResult<Execution> {
        self.get_json(&self.url(&format!("/meta/template-executions/{}", execution_id)))
            .await
    }

    async fn current_user(&self) -> AppResult<serde_json::Value> {
        self.get_json(&self.url("/me")).await
    }
}
