//! alfred CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — write a starter config file
//! - `run`     — execute a single task and print the answer
//! - `chat`    — interactive session with persistent memory

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "alfred", about = "alfred — a self-correcting personal agent", version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Onboard,

    /// Execute a single task and print the answer
    Run {
        /// The task, in plain language
        task: String,

        /// Run under a specific role (persona + tool scope)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Start an interactive session
    Chat {
        /// Run under a specific role (persona + tool scope)
        #[arg(short, long)]
        role: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Run { task, role } => commands::run::run(task, role).await?,
        Commands::Chat { role } => commands::chat::run(role).await?,
    }

    Ok(())
}
