//! Run command handler.
//!
//! Resolves a template's fields, collects values from flags and files, and
//! drives the execution to its generated content.

use anyhow::{bail, Context};
use clap::Args;
use promptify_client::{create_client, ExecutionHandler};
use promptify_core::{config::AppConfig, AppError, AppResult};
use promptify_template::{FieldKind, FieldValues, TemplateField};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Run a template and print the generated content
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Template ID
    pub template: u64,

    /// Field value, repeatable
    #[arg(short, long = "input", value_name = "NAME=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// JSON file holding an object of field values (flags take precedence)
    #[arg(long, value_name = "FILE")]
    pub inputs_file: Option<PathBuf>,

    /// Output template metadata and content as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Running template {}", self.template);
        tracing::debug!("Run options: {:?}", self);

        let api = create_client(config)?;
        let template = api.get_template(self.template).await?;
        let schema = template.fields();

        let values = collect_values(&schema, self.inputs_file.as_deref(), &self.inputs)
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;

        let generated = ExecutionHandler::new(api)
            .execute(self.template, &schema, &values)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&generated)?);
        } else {
            println!("{}", generated.content);
        }

        Ok(())
    }
}

fn parse_input(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("expected NAME=VALUE, got '{}'", raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("missing field name in '{}'", raw);
    }
    Ok((name.to_string(), value.to_string()))
}

/// Merge file values and flag values; flags win.
///
/// Flag values for `number` fields become JSON numbers when they parse.
fn collect_values(
    schema: &[TemplateField],
    inputs_file: Option<&Path>,
    inputs: &[(String, String)],
) -> anyhow::Result<FieldValues> {
    let mut values = match inputs_file {
        Some(path) => read_values_file(path)?,
        None => FieldValues::new(),
    };

    for (name, raw) in inputs {
        let kind = schema
            .iter()
            .find(|field| &field.name == name)
            .map(|field| field.kind);

        if kind.is_none() {
            tracing::warn!("'{}' is not a field of this template", name);
        }

        values.insert(name.clone(), typed_value(kind, raw));
    }

    Ok(values)
}

fn read_values_file(path: &Path) -> anyhow::Result<FieldValues> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read inputs file {:?}", path))?;

    match serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse inputs file {:?}", path))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("Inputs file {:?} must contain a JSON object", path),
    }
}

fn typed_value(kind: Option<FieldKind>, raw: &str) -> Value {
    if kind == Some(FieldKind::Number) {
        if let Ok(n) = raw.trim().parse::<i64>() {
            return Value::from(n);
        }
        if let Some(n) = raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}
