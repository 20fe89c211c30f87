//! Graphlab CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "graphlab")]
#[command(about = "Interactive graph engine: edge-list import, shortest paths, force layout and timelapse replay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an edge list and report what was built
    Import {
        /// Edge list, one `source,target[,weight]` per line
        file: PathBuf,

        /// Treat edges as directed
        #[arg(short, long)]
        directed: bool,

        /// Write the resulting action log here
        #[arg(long)]
        log_out: Option<PathBuf>,
    },
    /// Find the cheapest path between two vertices of an edge list
    Path {
        file: PathBuf,
        start: i64,
        end: i64,

        #[arg(short, long)]
        directed: bool,
    },
    /// Run the force layout over an edge list and print final positions
    Layout {
        file: PathBuf,

        /// Number of fixed simulation steps
        #[arg(short, long, default_value = "500")]
        ticks: usize,

        #[arg(short, long)]
        directed: bool,
    },
    /// Rebuild a graph from an action log, streaming events as JSON lines
    Replay {
        /// Action log, one record per line
        log: PathBuf,

        /// Pause between commands, overriding the configuration
        #[arg(short, long)]
        pacing_ms: Option<u64>,
    },
    /// Print order, size and per-vertex degrees of an edge list
    Stats {
        file: PathBuf,

        #[arg(short, long)]
        directed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("graphlab={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Graphlab v{}", env!("CARGO_PKG_VERSION"));
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Import { file, directed, log_out } => {
            commands::import(config, &file, directed, log_out.as_deref())
        }
        Commands::Path { file, start, end, directed } => {
            commands::path(config, &file, start, end, directed)
        }
        Commands::Layout { file, ticks, directed } => {
            commands::layout(config, &file, ticks, directed)
        }
        Commands::Replay { log, pacing_ms } => {
            commands::replay(config, &log, pacing_ms).await
        }
        Commands::Stats { file, directed } => {
            commands::stats(config, &file, directed)
        }
    }
}
