//! Promptify CLI
//!
//! Main entry point for the promptify command-line tool.
//! Lists templates, shows their input fields and runs them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AuthCommand, FieldsCommand, RunCommand, TemplatesCommand};
use promptify_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Promptify CLI - run Promptify templates from the command line
#[derive(Parser, Debug)]
#[command(name = "promptify")]
#[command(about = "Run Promptify prompt templates", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PROMPTIFY_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PROMPTIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Promptify API base URL
    #[arg(long, global = true, env = "PROMPTIFY_API_URL")]
    api_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List published templates
    Templates(TemplatesCommand),

    /// Show the input fields of a template
    Fields(FieldsCommand),

    /// Run a template and print the generated content
    Run(RunCommand),

    /// Credential checks
    Auth(AuthCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        None,
        None,
        cli.api_url,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Configuration: {:?}", config);

    let command_name = match &cli.command {
        Commands::Templates(_) => "templates",
        Commands::Fields(_) => "fields",
        Commands::Run(_) => "run",
        Commands::Auth(_) => "auth",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Templates(cmd) => cmd.execute(&config).await,
        Commands::Fields(cmd) => cmd.execute(&config).await,
        Commands::Run(cmd) => cmd.execute(&config).await,
        Commands::Auth(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
