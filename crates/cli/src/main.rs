//! Ragbot CLI
//!
//! Entry point for the `ragbot` binary: an interactive terminal menu,
//! one-shot commands, and `serve` for the HTTP API.

mod commands;
mod context;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, HistoryCommand, InteractiveCommand, ResetCommand, SearchCommand, ServeCommand,
    StatusCommand, UploadCommand,
};
use context::AppContext;
use ragbot_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Ragbot - chat with your documents
#[derive(Parser, Debug)]
#[command(name = "ragbot")]
#[command(about = "Chat with your documents using retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to YAML config file (default: ragbot.yaml when present)
    #[arg(short, long, global = true, env = "RAGBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the LLM registry (default: config/llm.json)
    #[arg(long, global = true)]
    llm_config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG and --verbose
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive menu (default)
    Interactive(InteractiveCommand),

    /// Process and index files or a directory
    Upload(UploadCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Show the chunks most similar to a query
    Search(SearchCommand),

    /// Show system status
    Status(StatusCommand),

    /// Show conversation history
    History(HistoryCommand),

    /// Delete every indexed document
    Reset(ResetCommand),

    /// Run the HTTP API
    Serve(ServeCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Interactive(_) => "interactive",
            Self::Upload(_) => "upload",
            Self::Ask(_) => "ask",
            Self::Search(_) => "search",
            Self::Status(_) => "status",
            Self::History(_) => "history",
            Self::Reset(_) => "reset",
            Self::Serve(_) => "serve",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config)?.with_overrides(
        cli.llm_config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Ragbot starting");
    tracing::debug!("LLM registry: {:?}", config.llm_config_path);
    tracing::debug!("Vector store: {:?}", config.persist_directory);

    let command = cli
        .command
        .unwrap_or(Commands::Interactive(InteractiveCommand {}));

    let _span = tracing::info_span!("command", name = command.name()).entered();

    let ctx = AppContext::build(config).await?;

    let result = match command {
        Commands::Interactive(cmd) => cmd.execute(&ctx).await,
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::Ask(cmd) => cmd.execute(&ctx).await,
        Commands::Search(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::History(cmd) => cmd.execute(&ctx).await,
        Commands::Reset(cmd) => cmd.execute(&ctx).await,
        Commands::Serve(cmd) => cmd.execute(ctx).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
