//! Folio CLI
//!
//! Main entry point for the folio command-line tool.
//! Translates EPUB books chapter by chapter with a large language model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ShowChaptersCommand, ShowChunksCommand, TranslateCommand};
use folio_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Folio - translate EPUB books with large language models
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Translate EPUB books with large language models", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./folio.yaml when present)
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
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

    /// LLM provider (openai, anthropic, google, ollama, echo)
    #[arg(short, long, global = true, env = "FOLIO_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "FOLIO_MODEL")]
    model: Option<String>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Maximum chunk size in characters
    #[arg(long, global = true)]
    max_chunk_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the book
    Translate(TranslateCommand),

    /// Show the chunks of the book chapters and estimated prices for each
    ShowChunks(ShowChunksCommand),

    /// Show the chapters of the book
    ShowChapters(ShowChaptersCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file and environment
    let config = AppConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.provider,
        cli.model,
        cli.temperature,
        cli.max_chunk_size,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model());
    if let Some(ref path) = config.config_file {
        tracing::debug!("Config file: {}", path.display());
    }

    let command_name = match &cli.command {
        Commands::Translate(_) => "translate",
        Commands::ShowChunks(_) => "show-chunks",
        Commands::ShowChapters(_) => "show-chapters",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Translate(cmd) => cmd.execute(&config).await,
        Commands::ShowChunks(cmd) => cmd.execute(&config),
        Commands::ShowChapters(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
