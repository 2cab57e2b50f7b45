//! Mira CLI: the main entry point.
//!
//! Commands:
//! - `chat`    Interactive RAG chat (default when no command is given)
//! - `index`   Load documents, build the index, optionally run a query
//! - `config`  Show, locate or initialize the configuration file

use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{debug, warn};

mod commands;

#[derive(Parser)]
#[command(
    name = "mira",
    about = "Mira: a command-line RAG chat companion",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Username for this session (prompted for when omitted)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with Mira
    Chat,

    /// Load documents and build the retrieval index
    Index {
        /// Run one retrieval query against the fresh index
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (keys redacted)
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before logging starts, so a RUST_LOG in .env applies too
    let env_file = commands::load_env_file(Path::new(".env"));

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    // Keep the chat screen clean unless asked otherwise
    let filter = match (&command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Chat, false) => "warn",
        (_, false) => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match env_file {
        Ok(true) => debug!("Loaded environment from .env"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Could not read .env"),
    }

    match command {
        Commands::Chat => commands::chat::run(cli.user).await?,
        Commands::Index { query } => commands::index::run(query).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
