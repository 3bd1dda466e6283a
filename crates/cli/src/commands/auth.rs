//! Auth command handler.
//!
//! Verifies that the configured token is accepted by the API.

use clap::{Args, Subcommand};
use promptify_client::create_client;
use promptify_core::{config::AppConfig, AppResult};

/// Credential checks
#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub action: AuthAction,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Call the API with the configured token
    Check,
}

impl AuthCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match self.action {
            AuthAction::Check => check(config).await,
        }
    }
}

async fn check(config: &AppConfig) -> AppResult<()> {
    tracing::info!("Checking credentials against {}", config.api_url);

    let api = create_client(config)?;
    let user = api.current_user().await?;

    let who = ["username", "email", "id"]
        .iter()
        .find_map(|key| user.get(*key).filter(|v| !v.is_null()))
        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
        .unwrap_or_else(|| "unknown user".to_string());

    println!("Authenticated as {}", who);
    Ok(())
}
