//! `tile` command: resolve and save one image tile.

use std::path::PathBuf;

use clap::Args;

use crate::commands::build_engine;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct TileArgs {
    /// Zoom level
    pub z: u8,
    /// Tile column
    pub x: u32,
    /// Tile row
    pub y: u32,
    /// Output file (default: tile_{z}_{x}_{y}.jpg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Protocol version override (default: current, from the root document)
    #[arg(long)]
    pub version: Option<u16>,
}

pub async fn run(args: TileArgs) -> Result<(), CliError> {
    let engine = build_engine()?;
    let dbroot = engine.fetch_version_and_key().await?;
    let version = args.version.unwrap_or(dbroot.version);

    let tile = engine
        .resolve_tile(args.x, args.y, args.z, version, &dbroot.key)
        .await?
        .ok_or(CliError::TileUnavailable {
            z: args.z,
            x: args.x,
            y: args.y,
        })?;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("tile_{}_{}_{}.jpg", args.z, args.x, args.y)));
    std::fs::write(&path, &tile)?;
    println!("wrote {} bytes to {}", tile.len(), path.display());
    Ok(())
}
