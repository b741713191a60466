//! In-memory packet cache.
//!
//! Caches raw flatfile response bodies keyed by `(collection, version,
//! address)`. Bodies are stored exactly as received from the upstream,
//! before decryption, so a cached entry stays valid even if the decryption
//! key is refreshed.
//!
//! Concurrent misses for the same key are *not* coalesced: each caller
//! fetches independently and the last insert wins. Packet bodies are
//! identical for a given key, so duplicate work is the only cost, and
//! it keeps the fetch path free of per-key locking.

use moka::future::Cache;
use tracing::debug;

use crate::fetch::FetchError;

/// Which flatfile database a packet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Current imagery (`kh.google.com`).
    Earth,
    /// Historical imagery (`khmdb.google.com`, `db=tm`).
    History,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Earth => f.write_str("earth"),
            Collection::History => f.write_str("history"),
        }
    }
}

/// Byte-bounded cache of raw packet bodies.
pub struct PacketCache {
    cache: Cache<String, Vec<u8>>,
}

impl PacketCache {
    /// Creates a cache bounded to `max_bytes` of packet data.
    ///
    /// Entries are weighed by body length, so the bound tracks actual
    /// memory use rather than entry count.
    pub fn new(max_bytes: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_key: &String, value: &Vec<u8>| -> u32 {
                value.len().try_into().unwrap_or(u32::MAX)
            })
            .build();
        Self { cache }
    }

    /// Returns the cached body for the key, or runs `fetch` and caches
    /// its result.
    ///
    /// Fetch errors are returned without touching the cache, so a failed
    /// request is retried on the next call.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        collection: Collection,
        version: u16,
        address: &str,
        fetch: F,
    ) -> Result<Vec<u8>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<u8>, FetchError>>,
    {
        let key = format!("{collection}:{version}:{address}");

        if let Some(body) = self.cache.get(&key).await {
            debug!(%key, size = body.len(), "packet cache hit");
            return Ok(body);
        }

        debug!(%key, "packet cache miss");
        let body = fetch().await?;
        self.cache.insert(key, body.clone()).await;
        Ok(body)
    }

    /// Number of cached entries. Moka counts lazily; callers needing an
    /// exact figure should run pending tasks first.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
