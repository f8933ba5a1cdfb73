//! Axon - goal-directed agent runtime

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{init_command, pursue_command, status_command};

/// Axon - a BDI agent runtime with a coordination kernel
#[derive(Parser)]
#[command(name = "axon")]
#[command(about = "Goal-directed agent runtime")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and workspace
    Init,
    /// Run the agent against a goal until it reaches a terminal status
    Pursue {
        /// Goal description
        #[arg(short, long)]
        goal: String,
        /// Cycle budget override
        #[arg(short, long)]
        max_cycles: Option<u32>,
        /// Run with the scripted oracle (no credentials needed)
        #[arg(long)]
        scripted: bool,
    },
    /// Show kernel telemetry
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("Init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Pursue {
            goal,
            max_cycles,
            scripted,
        } => {
            if let Err(e) = pursue_command(goal, max_cycles, scripted).await {
                error!("Pursue failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Status => {
            if let Err(e) = status_command().await {
                error!("Status failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
