//! Tile resolution engine.
//!
//! [`TileEngine`] composes the transport, the packet cache, and the codecs
//! into the operations a client actually needs: resolve an image tile by
//! XYZ coordinate, query the historical timeline of a point, and bootstrap
//! version plus key from the root metadata documents.
//!
//! The engine carries no HTTP server semantics and does no response
//! formatting; callers own both. Construct it once with an injected
//! transport and cache and share it.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::cache::{Collection, PacketCache};
use crate::crypt;
use crate::dbroot::{parse_dbroot, parse_version, DbRoot, DbRootError, KeyBundle};
use crate::error::DecodeError;
use crate::fetch::{endpoints, FetchError, HttpFetch};
use crate::history::{get_history_nodes, HistoryNode, Layer};
use crate::qtree::{get_nodes_from_qtree, parse_qtree, CoverageMap, TileNode};
use crate::quad::{coord_to_xyz, QuadKey};

/// Errors raised while resolving tiles or metadata.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport failure talking to the upstream.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A fetched payload failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A root metadata document failed to parse.
    #[error(transparent)]
    DbRoot(#[from] DbRootError),
}

/// Composes cache, transport, and codecs into tile-level operations.
pub struct TileEngine {
    fetch: Arc<dyn HttpFetch>,
    cache: PacketCache,
}

impl TileEngine {
    /// Creates an engine over an injected transport and packet cache.
    pub fn new(fetch: Arc<dyn HttpFetch>, cache: PacketCache) -> Self {
        Self { fetch, cache }
    }

    /// Fetches and parses the imagery root metadata document.
    ///
    /// The returned version addresses packets and tiles; the returned key
    /// decrypts every payload of both databases.
    pub async fn fetch_version_and_key(&self) -> Result<DbRoot, EngineError> {
        let body = self.fetch.get(&endpoints::dbroot()).await?;
        Ok(parse_dbroot(&body)?)
    }

    /// Fetches the historical database's protocol version.
    ///
    /// The historical database publishes its own version but shares the
    /// imagery document's key.
    pub async fn fetch_history_version(&self) -> Result<u16, EngineError> {
        let body = self.fetch.get(&endpoints::history_dbroot()).await?;
        Ok(parse_version(&body)?)
    }

    /// Resolves one image tile by XYZ coordinate.
    ///
    /// Walks quad key to packet address, decodes the covering packet (from
    /// cache when available), reads the tile's own imagery version out of
    /// the coverage map, then fetches and decrypts the tile.
    ///
    /// Returns `Ok(None)` when the coverage map has no imagery for the
    /// tile, or when the upstream serves unmarked bytes for it; both are
    /// normal "no such tile" outcomes, not errors.
    pub async fn resolve_tile(
        &self,
        x: u32,
        y: u32,
        z: u8,
        version: u16,
        key: &KeyBundle,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        let quad = QuadKey::from_xyz(x, y, z);
        let address = quad.packet_address();
        let coverage = self.imagery_coverage(&address, version, key).await?;

        let Some(tile_version) = coverage
            .get(&quad)
            .and_then(|node| node.as_ref())
            .map(|node| node.imagery_version)
        else {
            debug!(%quad, %address, "no imagery coverage for tile");
            return Ok(None);
        };

        let body = self.fetch.get(&endpoints::tile(&quad, tile_version)).await?;
        Ok(crypt::decode_tile(&body, key))
    }

    /// Queries the layer list of a point in the historical database.
    ///
    /// The point is snapped to its containing tile at `level` and the quad
    /// key is derived from that tile's center, so a point sitting exactly
    /// on a quadrant boundary resolves to the tile that contains it rather
    /// than bisecting ambiguously.
    ///
    /// Returns `Ok(None)` when the covering packet holds no node for the
    /// point's quad key.
    pub async fn resolve_history_layers(
        &self,
        lat: f64,
        lon: f64,
        level: u8,
        version: u16,
        key: &KeyBundle,
    ) -> Result<Option<Vec<Layer>>, EngineError> {
        let (x, y) = coord_to_xyz(lat, lon, level);
        let quad = QuadKey::from_xyz(x, y, level);
        let address = quad.packet_address();
        let coverage = self.history_coverage(&address, version, key).await?;

        Ok(coverage
            .get(&quad)
            .and_then(|node| node.as_ref())
            .map(|node| node.layers.clone()))
    }

    /// Fetches and decrypts one dated tile from the historical database.
    ///
    /// `date` is a `YYYY-MM-DD` string from a previously resolved
    /// timeline; the upstream appends it verbatim to the tile address.
    pub async fn resolve_history_tile(
        &self,
        x: u32,
        y: u32,
        z: u8,
        version: u16,
        date: &str,
        key: &KeyBundle,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        let quad = QuadKey::from_xyz(x, y, z);
        let url = endpoints::history_tile(&quad, version, date);
        let body = self.fetch.get(&url).await?;
        Ok(crypt::decode_tile(&body, key))
    }

    /// Decodes the imagery packet covering `address`, raw bytes cached.
    async fn imagery_coverage(
        &self,
        address: &QuadKey,
        version: u16,
        key: &KeyBundle,
    ) -> Result<CoverageMap<TileNode>, EngineError> {
        let url = endpoints::qtree_packet(address, version);
        let raw = self
            .cache
            .get_or_fetch(Collection::Earth, version, address.as_str(), || async {
                self.fetch.get(&url).await
            })
            .await?;

        let decoded = crypt::decode_qtree_packet(&raw, key)?;
        let nodes = get_nodes_from_qtree(&decoded)?;
        Ok(parse_qtree(&nodes, Some(address)))
    }

    /// Decodes the historical packet covering `address`, raw bytes cached.
    async fn history_coverage(
        &self,
        address: &QuadKey,
        version: u16,
        key: &KeyBundle,
    ) -> Result<CoverageMap<HistoryNode>, EngineError> {
        let url = endpoints::history_packet(address, version);
        let raw = self
            .cache
            .get_or_fetch(Collection::History, version, address.as_str(), || async {
                self.fetch.get(&url).await
            })
            .await?;

        let decoded = crypt::decode_qtree_packet(&raw, key)?;
        let nodes = get_history_nodes(&decoded)?;
        Ok(parse_qtree(&nodes, Some(address)))
    }
}
