//! Templates command handler.
//!
//! Lists the published template catalog.

use clap::Args;
use promptify_client::create_client;
use promptify_core::{config::AppConfig, AppResult};

/// List published templates
#[derive(Args, Debug)]
pub struct TemplatesCommand {
    /// Only show templates whose title contains this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl TemplatesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Fetching template catalog");

        let api = create_client(config)?;
        let mut templates = api.list_templates().await?;

        if let Some(ref filter) = self.filter {
            let needle = filter.to_lowercase();
            templates.retain(|t| t.title.to_lowercase().contains(&needle));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&templates)?);
            return Ok(());
        }

        if templates.is_empty() {
            println!("No templates found");
            return Ok(());
        }

        for template in &templates {
            match template.description.as_deref().filter(|d| !d.is_empty()) {
                Some(description) => {
                    println!("{:>6}  {} - {}", template.id, template.title, description)
                }
                None => println!("{:>6}  {}", template.id, template.title),
            }
        }

        Ok(())
    }
}
