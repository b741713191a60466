//! CLI command implementations.

pub mod history;
pub mod tile;
pub mod version;

use std::sync::Arc;

use khflat::cache::PacketCache;
use khflat::fetch::ReqwestFetch;
use khflat::TileEngine;

use crate::error::CliError;

/// Packet cache budget. Packets are a few KiB each; this covers far more
/// coverage than a single invocation ever touches.
const CACHE_BYTES: u64 = 64 * 1024 * 1024;

/// Builds the engine every command runs against.
pub fn build_engine() -> Result<TileEngine, CliError> {
    let fetch = Arc::new(ReqwestFetch::new()?);
    Ok(TileEngine::new(fetch, PacketCache::new(CACHE_BYTES)))
}
