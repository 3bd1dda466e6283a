//! Fields command handler.
//!
//! Shows the input schema parsed from a template's prompts.

use clap::Args;
use promptify_client::create_client;
use promptify_core::{config::AppConfig, AppResult};
use promptify_template::TemplateField;

/// Show the input fields of a template
#[derive(Args, Debug)]
pub struct FieldsCommand {
    /// Template ID
    pub template: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FieldsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Resolving fields of template {}", self.template);

        let api = create_client(config)?;
        let template = api.get_template(self.template).await?;
        let fields = template.fields();

        tracing::debug!(
            "Template '{}' has {} prompts and {} fields",
            template.title,
            template.prompts.len(),
            fields.len()
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&fields)?);
            return Ok(());
        }

        println!("{} ({})", template.title, template.slug);
        if fields.is_empty() {
            println!("  no input fields");
        }
        for field in &fields {
            println!("  {}", describe(field));
        }

        Ok(())
    }
}

/// One-line summary: `name (Display name): kind, required [a|b]`.
fn describe(field: &TemplateField) -> String {
    let mut line = format!(
        "{} ({}): {}, {}",
        field.name,
        field.display_name,
        field.kind.as_str(),
        if field.required { "required" } else { "optional" }
    );
    if let Some(ref choices) = field.choices {
        line.push_str(&format!(" [{}]", choices.join("|")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptify_template::extract_fields;

    #[test]
    fn test_describe_field() {
        let fields = extract_fields([r#"{{firstName}} {{mood:choices:false:"calm,busy"}}"#]);
        assert_eq!(describe(&fields[0]), "firstName (First name): text, required");
        assert_eq!(
            describe(&fields[1]),
            "mood (Mood): choice, optional [calm|busy]"
        );
    }
}
