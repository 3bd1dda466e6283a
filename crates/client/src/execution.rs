//! Template execution over the event stream.
//!
//! A run goes `Idle → Opening → Streaming → Closed`, or ends in `Failed` from
//! any phase after `Idle`. While streaming, only two things matter: the first
//! execution identifier announced by an `infer` event, and the close of the
//! stream. Every other event is narration. After close, the execution record
//! is fetched once and its first prompt output becomes the artifact.
//!
//! Remote failures are reported as [`AppError::ExecutionFailed`]; the upstream
//! detail goes to the error log only.

use futures::StreamExt;
use promptify_core::{AppError, AppResult, Claims};
use promptify_template::{ensure_required, FieldValues, TemplateField, TemplateMeta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::client::{Execution, ExecutionRequest, ServerEvent, TemplateApi};
use crate::payload::{
    mentions_execution_id, parse_payload, EventPayload, ProgressMarker, EXECUTION_ID_FIELD,
};

/// Tag of the event that announces the execution identifier.
pub const INFER_TAG: &str = "infer";

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub template: TemplateMeta,
    pub content: String,
}

/// Lifecycle phase of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Opening,
    Streaming,
    Closed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What an inbound event did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// This event supplied the execution identifier.
    Claimed(u64),
    /// Nothing changed.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not an identifier event.
    Narration,
    /// An identifier event after the identifier was already known.
    AlreadyClaimed,
    /// An identifier event whose payload did not parse.
    Malformed,
    /// The run is no longer streaming.
    NotStreaming,
}

/// Mutable state of one in-flight execution.
#[derive(Debug)]
pub struct ExecutionState {
    phase: Phase,
    execution_id: Claims<&'static str, u64>,
    transcript: String,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            execution_id: Claims::new(),
            transcript: String::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn execution_id(&self) -> Option<u64> {
        self.execution_id.get(EXECUTION_ID_FIELD).copied()
    }

    /// Narration messages seen so far, concatenated.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// `Idle → Opening`: the batch is being submitted.
    pub fn begin(&mut self) {
        debug_assert_eq!(self.phase, Phase::Idle);
        self.phase = Phase::Opening;
    }

    /// `Opening → Streaming`, or `Failed` on a client-error status.
    ///
    /// Statuses outside 2xx that are not client errors (429, 5xx) are only
    /// logged; the body is still consumed and the close decides the outcome.
    pub fn on_open(&mut self, status: u16, status_text: &str) -> AppResult<()> {
        if (400..500).contains(&status) && status != 429 {
            self.phase = Phase::Failed;
            tracing::error!("Execution stream rejected ({}): {}", status, status_text);
            return Err(AppError::Rejected {
                status,
                reason: status_text.to_string(),
            });
        }

        if !(200..300).contains(&status) {
            tracing::warn!(
                "Execution stream opened with status {} {}",
                status,
                status_text
            );
        }

        self.phase = Phase::Streaming;
        Ok(())
    }

    /// `Streaming → Streaming`: interpret one event.
    pub fn on_event(&mut self, event: &ServerEvent) -> EventOutcome {
        if self.phase != Phase::Streaming {
            return EventOutcome::Ignored(IgnoreReason::NotStreaming);
        }

        if event.tag == INFER_TAG && mentions_execution_id(&event.data) {
            if self.execution_id.is_claimed(EXECUTION_ID_FIELD) {
                return EventOutcome::Ignored(IgnoreReason::AlreadyClaimed);
            }

            return match parse_payload::<EventPayload>(&event.data) {
                Ok(EventPayload {
                    template_execution_id: Some(id),
                    ..
                }) => {
                    self.execution_id.claim(EXECUTION_ID_FIELD, id);
                    EventOutcome::Claimed(id)
                }
                Ok(_) => EventOutcome::Ignored(IgnoreReason::Malformed),
                Err(e) => {
                    tracing::debug!("Unparseable identifier event ({}): {}", e, event.data);
                    EventOutcome::Ignored(IgnoreReason::Malformed)
                }
            };
        }

        self.record_narration(event);
        EventOutcome::Ignored(IgnoreReason::Narration)
    }

    fn record_narration(&mut self, event: &ServerEvent) {
        let Ok(EventPayload {
            message: Some(message),
            ..
        }) = parse_payload::<EventPayload>(&event.data)
        else {
            tracing::trace!("Narration event '{}': {}", event.tag, event.data);
            return;
        };

        match ProgressMarker::detect(&message) {
            Some(ProgressMarker::Initializing) => tracing::debug!("Execution initializing"),
            Some(ProgressMarker::Completed) => tracing::debug!("Execution reported completion"),
            Some(ProgressMarker::Error) => tracing::warn!("Execution reported: {}", message),
            None => self.transcript.push_str(&message),
        }
    }

    /// `Streaming → Closed`: the identifier to look up, or `Failed` if none
    /// was ever announced.
    pub fn on_close(&mut self) -> AppResult<u64> {
        if self.phase == Phase::Failed {
            return Err(AppError::ExecutionFailed);
        }

        match self.execution_id() {
            Some(id) => {
                self.phase = Phase::Closed;
                Ok(id)
            }
            None => Err(self.fail("stream closed before an execution id was announced")),
        }
    }

    /// Turn the fetched record into the artifact, or `Failed` if it reports errors.
    pub fn on_record(&mut self, execution: &Execution) -> AppResult<String> {
        if let Some(detail) = execution.error_detail() {
            return Err(self.fail(format_args!(
                "execution {} reported errors: {}",
                execution.id, detail
            )));
        }

        let output = match execution.prompt_executions.as_deref() {
            None => "",
            Some([first, ..]) => first.output.as_str(),
            Some([]) => {
                return Err(self.fail(format_args!(
                    "execution {} has no prompt executions",
                    execution.id
                )))
            }
        };

        Ok(clean_output(output))
    }

    /// Enter `Failed`, logging the detail that the returned error hides.
    pub fn fail(&mut self, detail: impl fmt::Display) -> AppError {
        tracing::error!(
            phase = %self.phase,
            execution_id = ?self.execution_id(),
            "Execution failed: {}",
            detail
        );
        if !self.transcript.is_empty() {
            tracing::debug!("Narration before failure: {}", self.transcript);
        }
        self.phase = Phase::Failed;
        AppError::ExecutionFailed
    }
}

/// Drop every newline with the whitespace after it, then anything before the
/// first `{`. Outputs are JSON documents, sometimes preceded by narration.
pub fn clean_output(output: &str) -> String {
    let mut joined = String::with_capacity(output.len());
    let mut chars = output.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
        } else {
            joined.push(ch);
        }
    }

    match joined.find('{') {
        Some(start) => joined.split_off(start),
        None => joined,
    }
}

/// Drives template executions through a [`TemplateApi`].
pub struct ExecutionHandler {
    api: Arc<dyn TemplateApi>,
}

impl ExecutionHandler {
    pub fn new(api: Arc<dyn TemplateApi>) -> Self {
        Self { api }
    }

    /// Run a template with the given values.
    ///
    /// `schema` is the field list extracted from the template beforehand.
    /// Missing required values abort before any request is made.
    ///
    /// # Example
    /// ```no_run
    /// use promptify_client::{ExecutionHandler, HttpTemplateApi};
    /// use promptify_template::FieldValues;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let api = Arc::new(HttpTemplateApi::new("https://api.promptify.com/api", "token")?);
    /// let template = promptify_client::TemplateApi::get_template(api.as_ref(), 12).await?;
    ///
    /// let mut values = FieldValues::new();
    /// values.insert("topic".into(), "rust".into());
    ///
    /// let handler = ExecutionHandler::new(api);
    /// let generated = handler.execute(12, &template.fields(), &values).await?;
    /// println!("{}", generated.content);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(
        &self,
        template_id: u64,
        schema: &[TemplateField],
        values: &FieldValues,
    ) -> AppResult<GeneratedContent> {
        ensure_required(schema, values)?;

        let template = self.api.get_template(template_id).await?;
        let batch = ExecutionRequest::batch(&template, values);

        let mut state = ExecutionState::new();
        state.begin();

        let stream = match self.api.open_execution(template_id, &batch).await {
            Ok(stream) => stream,
            Err(e) => return Err(state.fail(e)),
        };

        state.on_open(stream.status, &stream.status_text)?;
        if (200..300).contains(&stream.status) {
            tracing::info!("Generating: {}", template.title);
        }

        let mut events = stream.events;
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => match state.on_event(&event) {
                    EventOutcome::Claimed(id) => tracing::info!("Execution id: {}", id),
                    EventOutcome::Ignored(reason) => {
                        tracing::trace!("Ignored '{}' event: {:?}", event.tag, reason)
                    }
                },
                Err(e) => return Err(state.fail(e)),
            }
        }
        drop(events);

        let execution_id = state.on_close()?;
        tracing::debug!("Stream closed, fetching execution {}", execution_id);

        let execution = match self.api.get_execution(execution_id).await {
            Ok(execution) => execution,
            Err(e) => return Err(state.fail(e)),
        };
        let content = state.on_record(&execution)?;

        tracing::info!("Generated {} bytes for '{}'", content.len(), template.title);

        Ok(GeneratedContent {
            template: TemplateMeta::from(&template),
            content,
        })
    }
}
