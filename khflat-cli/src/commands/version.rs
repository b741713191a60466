//! `version` command: print the current protocol versions.

use crate::commands::build_engine;
use crate::error::CliError;

pub async fn run() -> Result<(), CliError> {
    let engine = build_engine()?;

    let dbroot = engine.fetch_version_and_key().await?;
    let history_version = engine.fetch_history_version().await?;

    println!("imagery version: {}", dbroot.version);
    println!("history version: {}", history_version);
    Ok(())
}
