//! Template model and placeholder schema for the Promptify runner.
//!
//! This crate provides:
//! - Wire types of the template endpoints
//! - The `{{name:type:required:options}}` placeholder parser
//! - Required-field validation of supplied values

pub mod parser;
pub mod types;
pub mod validate;

// Re-export main types
pub use parser::{display_name, extract_fields};
pub use types::{
    FieldKind, FieldValues, Prompt, Template, TemplateField, TemplateMeta, TemplateSummary,
};
pub use validate::{ensure_required, missing_required};
