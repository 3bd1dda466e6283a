//! Template types for the Promptify runner.
//!
//! Wire shapes of the template endpoints plus the typed field schema derived
//! from prompt placeholders.

use serde::{Deserialize, Serialize};

/// Values supplied for a template's fields, keyed by field name.
pub type FieldValues = serde_json::Map<String, serde_json::Value>;

/// A template as returned by `GET /meta/templates/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: u64,

    /// Human-readable title
    pub title: String,

    pub slug: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Prompts in execution order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompts: Vec<Prompt>,
}

/// One prompt of a template; `content` carries the placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: u64,

    #[serde(default)]
    pub order: i64,

    #[serde(default)]
    pub title: String,

    /// Raw prompt text with `{{...}}` placeholders
    #[serde(default)]
    pub content: String,
}

/// Catalog entry from `GET /meta/templates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Template metadata echoed next to generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
}

impl From<&Template> for TemplateMeta {
    fn from(template: &Template) -> Self {
        Self {
            slug: template.slug.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
        }
    }
}

/// Input kind of a placeholder field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Choice,
}

impl FieldKind {
    /// Map a raw placeholder type token; unknown or absent tokens are text.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("integer") | Some("number") => Self::Number,
            Some("choices") => Self::Choice,
            Some("code") => Self::Text,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Choice => "choice",
        }
    }
}

/// A typed input field extracted from a `{{name:type:required:options}}` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,

    #[serde(rename = "displayName")]
    pub display_name: String,

    pub kind: FieldKind,

    pub required: bool,

    /// Only set for `FieldKind::Choice`, never empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
