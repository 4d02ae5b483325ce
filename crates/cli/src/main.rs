//! Codeindex CLI
//!
//! Main entry point for the codeindex command-line tool.
//! Inspects the code index configuration and manages the workspace's
//! Qdrant collection.

mod commands;

use clap::{Parser, Subcommand};
use codeindex_core::{config::AppConfig, logging, AppResult};
use commands::{ClearCommand, InitCommand, SearchCommand, StatusCommand, ValidateCommand};
use std::path::PathBuf;

/// Codeindex CLI - semantic code index over Qdrant
#[derive(Parser, Debug)]
#[command(name = "codeindex")]
#[command(about = "Semantic code index configuration and vector storage", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CODEINDEX_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to settings file
    #[arg(short, long, global = true, env = "CODEINDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Path to secrets file
    #[arg(long, global = true, env = "CODEINDEX_SECRETS")]
    secrets: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Proxy for outbound HTTP
    #[arg(long, global = true, env = "CODEINDEX_PROXY_URL")]
    proxy: Option<String>,

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
    /// Show the resolved index configuration
    Status(StatusCommand),

    /// Create or migrate the workspace collection
    Init(InitCommand),

    /// Semantic search over the indexed code
    Search(SearchCommand),

    /// Remove indexed points or the whole collection
    Clear(ClearCommand),

    /// Check the embedder configuration against its provider
    Validate(ValidateCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.secrets,
        cli.log_level,
        cli.proxy,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Codeindex CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Settings: {:?}", config.settings_path());

    let command_name = match &cli.command {
        Commands::Status(_) => "status",
        Commands::Init(_) => "init",
        Commands::Search(_) => "search",
        Commands::Clear(_) => "clear",
        Commands::Validate(_) => "validate",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Status(cmd) => cmd.execute(&config).await,
        Commands::Init(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Clear(cmd) => cmd.execute(&config).await,
        Commands::Validate(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
