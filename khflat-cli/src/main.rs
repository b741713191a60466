//! khflat CLI - thin command-line composer over the khflat library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "khflat", version, about = "Client for the Google Earth flatfile tile protocol")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the current imagery and history protocol versions
    Version,
    /// Resolve and save one image tile by XYZ coordinate
    Tile(commands::tile::TileArgs),
    /// Historical-imagery queries
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Version => commands::version::run().await,
        Commands::Tile(args) => commands::tile::run(args).await,
        Commands::History { action } => commands::history::run(action).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
