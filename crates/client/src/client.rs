//! Template API abstraction and wire types.
//!
//! `TemplateApi` is the seam between the execution handler and the HTTP
//! transport, so the handler can be driven by any event source.

use futures::Stream;
use promptify_core::AppResult;
use promptify_template::{FieldValues, Template, TemplateSummary};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// One entry of the execution batch posted to `/meta/templates/{id}/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Prompt to execute
    #[serde(rename = "prompt")]
    pub prompt_id: u64,

    /// Always empty; reserved by the API
    pub contextual_overrides: Vec<serde_json::Value>,

    /// Field values shared by every prompt of the template
    #[serde(rename = "prompt_params")]
    pub parameters: FieldValues,
}

impl ExecutionRequest {
    /// One request per template prompt, in prompt order.
    pub fn batch(template: &Template, values: &FieldValues) -> Vec<Self> {
        template
            .prompts
            .iter()
            .map(|prompt| Self {
                prompt_id: prompt.id,
                contextual_overrides: Vec::new(),
                parameters: values.clone(),
            })
            .collect()
    }
}

/// Execution record from `GET /meta/template-executions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: u64,

    #[serde(default)]
    pub title: Option<String>,

    /// Any non-empty value means the execution failed
    #[serde(default)]
    pub errors: Option<serde_json::Value>,

    #[serde(default, alias = "promptExecutions")]
    pub prompt_executions: Option<Vec<PromptExecution>>,
}

impl Execution {
    /// The upstream error detail, if the record reports one.
    pub fn error_detail(&self) -> Option<&serde_json::Value> {
        self.errors.as_ref().filter(|errors| is_set(errors))
    }

    /// Raw output of the first prompt execution.
    pub fn first_output(&self) -> Option<&str> {
        self.prompt_executions
            .as_deref()
            .and_then(|executions| executions.first())
            .map(|execution| execution.output.as_str())
    }
}

/// Output of one prompt within an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptExecution {
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub prompt: u64,

    #[serde(default)]
    pub output: String,

    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

fn is_set(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// A server-sent event: its tag (`event:` line) and joined `data:` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub tag: String,
    pub data: String,
}

impl ServerEvent {
    pub fn new(tag: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            data: data.into(),
        }
    }
}

/// Events of an open execution stream. An `Err` item is a transport failure;
/// the end of the stream is the close signal.
pub type EventStream = Pin<Box<dyn Stream<Item = AppResult<ServerEvent>> + Send>>;

/// An execution stream after the server answered the POST.
pub struct ExecutionStream {
    /// HTTP status code of the response
    pub status: u16,

    /// Canonical reason phrase for `status`
    pub status_text: String,

    pub events: EventStream,
}

impl std::fmt::Debug for ExecutionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionStream")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .finish_non_exhaustive()
    }
}

/// Trait for Promptify API access.
#[async_trait::async_trait]
pub trait TemplateApi: Send + Sync {
    /// Published, public templates.
    async fn list_templates(&self) -> AppResult<Vec<TemplateSummary>>;

    /// A template with its prompts.
    async fn get_template(&self, template_id: u64) -> AppResult<Template>;

    /// Submit an execution batch and keep the response open as an event stream.
    ///
    /// Returns as soon as the response head arrives, whatever its status.
    async fn open_execution(
        &self,
        template_id: u64,
        batch: &[ExecutionRequest],
    ) -> AppResult<ExecutionStream>;

    /// The stored record of an execution.
    async fn get_execution(&self, execution_id: u64) -> AppResult<Execution>;

    /// The account the configured token belongs to.
    async fn current_user(&self) -> AppResult<serde_json::Value>;
}
