//! Event payload interpretation.
//!
//! Stream payloads are JSON-like text. Narration events frequently use single
//! quotes (`{'message': '[INITIALIZING]'}`), so parsing falls back to a
//! quote-normalized copy when strict JSON fails.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Payload field carrying the execution identifier.
pub const EXECUTION_ID_FIELD: &str = "template_execution_id";

/// Fields of interest in an event payload. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub template_execution_id: Option<u64>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Progress markers the service emits as narration messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMarker {
    Initializing,
    Completed,
    Error,
}

impl ProgressMarker {
    pub fn detect(message: &str) -> Option<Self> {
        match message.trim() {
            "[INITIALIZING]" => Some(Self::Initializing),
            "[COMPLETED]" | "[C OMPLETED]" => Some(Self::Completed),
            m if m.contains("[ERROR]") => Some(Self::Error),
            _ => None,
        }
    }
}

/// Parse a payload, trying strict JSON first and then the quote-normalized form.
pub fn parse_payload<T: DeserializeOwned>(data: &str) -> Result<T, serde_json::Error> {
    let trimmed = data.trim();
    serde_json::from_str(trimmed).or_else(|strict| {
        let normalized = normalize_quotes(trimmed);
        if normalized == trimmed {
            return Err(strict);
        }
        serde_json::from_str(&normalized)
    })
}

/// Whether `data` could carry the execution identifier at all.
pub fn mentions_execution_id(data: &str) -> bool {
    data.contains(EXECUTION_ID_FIELD)
}

/// Rewrite single-quoted JSON-ish text into JSON.
///
/// Single quotes that delimit keys or values become double quotes. A single
/// quote inside a single-quoted string (`don't`) stays literal, as long as it
/// is not followed by a structural character. Raw newlines inside strings are
/// escaped.
pub fn normalize_quotes(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    let mut out = String::with_capacity(data.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match quote {
            None => {
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                    out.push('"');
                } else {
                    out.push(ch);
                }
            }
            Some(open) => {
                if ch == '\\' && i + 1 < chars.len() {
                    let next = chars[i + 1];
                    if open == '\'' && next == '\'' {
                        out.push('\'');
                    } else {
                        out.push(ch);
                        out.push(next);
                    }
                    i += 2;
                    continue;
                }

                if ch == open && (open == '"' || closes_string(&chars[i + 1..])) {
                    quote = None;
                    out.push('"');
                } else if ch == '"' {
                    out.push_str("\\\"");
                } else if ch == '\n' {
                    out.push_str("\\n");
                } else {
                    out.push(ch);
                }
            }
        }
        i += 1;
    }

    out
}

/// A single quote closes a string only when followed by structure.
fn closes_string(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ':' | ',' | '}' | ']'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json_payload() {
        let payload: EventPayload = parse_payload(" {\"template_execution_id\": 42}\n").unwrap();
        assert_eq!(payload.template_execution_id, Some(42));
        assert!(payload.message.is_none());
    }

    #[test]
    fn test_single_quoted_payload() {
        let payload: EventPayload =
            parse_payload("{'message': '[INITIALIZING]', 'template_execution_id': 7}").unwrap();
        assert_eq!(payload.template_execution_id, Some(7));
        assert_eq!(payload.message.as_deref(), Some("[INITIALIZING]"));
    }

    #[test]
    fn test_contractions_survive_normalization() {
        let payload: EventPayload =
            parse_payload("{'message': 'Don't say \"never\", it's fine', 'prompt_id': 3}").unwrap();
        assert_eq!(
            payload.message.as_deref(),
            Some("Don't say \"never\", it's fine")
        );
    }

    #[test]
    fn test_multiline_message() {
        let payload: EventPayload = parse_payload("{'message': 'line one\nline two'}").unwrap();
        assert_eq!(payload.message.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(parse_payload::<EventPayload>("not json").is_err());
        assert!(parse_payload::<EventPayload>("{'template_execution_id': 'abc'}").is_err());
        assert!(parse_payload::<EventPayload>("{\"template_execution_id\": ").is_err());
    }

    #[test]
    fn test_progress_markers() {
        assert_eq!(
            ProgressMarker::detect("[INITIALIZING]"),
            Some(ProgressMarker::Initializing)
        );
        assert_eq!(
            ProgressMarker::detect("[C OMPLETED]"),
            Some(ProgressMarker::Completed)
        );
        assert_eq!(
            ProgressMarker::detect("[ERROR] quota exceeded"),
            Some(ProgressMarker::Error)
        );
        assert_eq!(ProgressMarker::detect("Paris is lovely"), None);
    }

    #[test]
    fn test_mentions_execution_id() {
        assert!(mentions_execution_id("{'template_execution_id': 1}"));
        assert!(!mentions_execution_id("{'message': 'hi'}"));
    }
}
