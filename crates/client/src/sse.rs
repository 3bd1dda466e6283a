//! Server-Sent Events decoding.
//!
//! The execute endpoint answers with a `text/event-stream` body. Bytes arrive
//! in arbitrary chunks, so the decoder buffers partial lines and dispatches an
//! event at every blank line.

use futures::stream::{self, Stream, StreamExt};
use promptify_core::{AppError, AppResult};
use std::collections::VecDeque;

use crate::client::{EventStream, ServerEvent};

/// Tag of events that carry no `event:` line.
pub const DEFAULT_TAG: &str = "message";

/// Incremental `text/event-stream` decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    tag: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<ServerEvent> {
        if !self.buf.is_empty() {
            let line = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&line).trim_end_matches('\r').to_string();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comments
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.tag = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" | "retry" => {}
            other => tracing::trace!("Ignoring unknown SSE field: {}", other),
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        let tag = self.tag.take();
        if self.data.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerEvent {
            tag: tag
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TAG.to_string()),
            data,
        })
    }
}

/// Turn a response body into an [`EventStream`].
///
/// A transport error is yielded once and ends the stream.
pub fn event_stream<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = (
        body.boxed(),
        SseDecoder::new(),
        VecDeque::<AppResult<ServerEvent>>::new(),
        false,
    );

    let events = stream::unfold(state, |(mut body, mut decoder, mut pending, mut done)| async move {
        loop {
            if let Some(item) = pending.pop_front() {
                return Some((item, (body, decoder, pending, done)));
            }
            if done {
                return None;
            }

            match body.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.feed(chunk.as_ref()).into_iter().map(Ok)),
                Some(Err(e)) => {
                    done = true;
                    pending.push_back(Err(AppError::Http(format!("Event stream error: {}", e))));
                }
                None => {
                    done = true;
                    pending.extend(decoder.finish().map(Ok));
                }
            }
        }
    });

    Box::pin(events)
}
