//! Finsight CLI
//!
//! Main entry point for the finsight command-line tool: a retrieval-augmented
//! financial question-answering pipeline over a local knowledge store.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand, StatsCommand};
use finsight_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Finsight - cited financial answers from a local knowledge store
#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(about = "Cited financial answers from a local knowledge store", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "FINSIGHT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "FINSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama)
    #[arg(short, long, global = true, env = "FINSIGHT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "FINSIGHT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a financial question
    Ask(AskCommand),

    /// Ingest knowledge records from a JSON file
    Ingest(IngestCommand),

    /// Show knowledge store statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Finsight CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Surface configuration problems once, at startup
    config.validate()?;
    config.ensure_finsight_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Ingest(_) => "ingest",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
