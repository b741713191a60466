//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] khflat::engine::EngineError),

    #[error("failed to set up HTTP transport: {0}")]
    Transport(#[from] khflat::fetch::FetchError),

    #[error("no imagery available for tile {z}/{x}/{y}")]
    TileUnavailable { z: u8, x: u32, y: u32 },

    #[error("no historical coverage at the queried point")]
    NoCoverage,

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}
