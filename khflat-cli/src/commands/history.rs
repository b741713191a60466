//! `history` commands: query timelines and fetch dated tiles.

use std::path::PathBuf;

use clap::Subcommand;

use crate::commands::build_engine;
use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    /// Print the layer list of a point as JSON
    Query {
        /// Latitude in degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long)]
        lon: f64,
        /// Subdivision level to query at
        #[arg(long)]
        level: u8,
    },
    /// Resolve and save one dated tile
    Tile {
        /// Zoom level
        z: u8,
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,
        /// Capture date, YYYY-MM-DD, from a previous query
        #[arg(long)]
        date: String,
        /// Output file (default: tile_{z}_{x}_{y}_{date}.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(action: HistoryAction) -> Result<(), CliError> {
    let engine = build_engine()?;
    // The historical database has its own version but shares the imagery
    // document's key.
    let dbroot = engine.fetch_version_and_key().await?;
    let version = engine.fetch_history_version().await?;

    match action {
        HistoryAction::Query { lat, lon, level } => {
            let layers = engine
                .resolve_history_layers(lat, lon, level, version, &dbroot.key)
                .await?
                .ok_or(CliError::NoCoverage)?;
            println!("{}", serde_json::to_string_pretty(&layers)?);
            Ok(())
        }
        HistoryAction::Tile {
            z,
            x,
            y,
            date,
            output,
        } => {
            let tile = engine
                .resolve_history_tile(x, y, z, version, &date, &dbroot.key)
                .await?
                .ok_or(CliError::TileUnavailable { z, x, y })?;

            let path = output
                .unwrap_or_else(|| PathBuf::from(format!("tile_{z}_{x}_{y}_{date}.jpg")));
            std::fs::write(&path, &tile)?;
            println!("wrote {} bytes to {}", tile.len(), path.display());
            Ok(())
        }
    }
}
