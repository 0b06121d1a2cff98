use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use focuslock::{cli, config};

#[derive(Parser)]
#[command(name = "focuslock", version, about = "Project-idea pings grounded in your activity history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one idea, deliver it, and log it (the default)
    Run,
    /// Record an activity in the history
    Log {
        /// What you did; a timestamp is appended
        text: String,
    },
    /// Print the context the next run would use
    Context {
        /// Number of entries to include
        #[arg(long)]
        window: Option<usize>,
    },
    /// Print recent history entries
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Check history, index, model, and credentials
    Doctor,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.focuslock/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = config::FocusLockConfig::load()?;

    // Diagnostics go to stderr; stdout carries status lines.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command.unwrap_or(Command::Run) {
        Command::Run => cli::run::run(&config).await,
        Command::Log { text } => cli::log::log(&config, &text),
        Command::Context { window } => cli::context::context(&config, window),
        Command::History { limit } => cli::history::history(&config, limit),
        Command::Doctor => cli::doctor::doctor(&config),
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await,
        },
    }
}
