//! Pre-flight validation of supplied field values.

use promptify_core::{AppError, AppResult};

use crate::types::{FieldValues, TemplateField};

/// Display names of required fields that have no entry in `values`.
///
/// Only presence is checked: an explicit `null` or empty string counts as
/// supplied.
pub fn missing_required(schema: &[TemplateField], values: &FieldValues) -> Vec<String> {
    schema
        .iter()
        .filter(|field| field.required && !values.contains_key(&field.name))
        .map(|field| field.display_name.clone())
        .collect()
}

/// Fail with every missing required field if any is absent.
pub fn ensure_required(schema: &[TemplateField], values: &FieldValues) -> AppResult<()> {
    let missing = missing_required(schema, values);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingFields(missing))
    }
}
