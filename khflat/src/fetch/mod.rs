//! Upstream transport boundary.
//!
//! The core never talks HTTP directly; it goes through the [`HttpFetch`]
//! trait so tests can inject mock transports and applications can supply
//! their own client configuration. [`ReqwestFetch`] is the production
//! implementation.
//!
//! URL construction for the flatfile endpoints lives in [`endpoints`]; the
//! formats are part of the wire protocol and are reproduced exactly.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::quad::QuadKey;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised by the transport layer.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Request construction or transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from the upstream.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// Async HTTP GET abstraction.
///
/// Dyn-compatible via boxed futures so the engine can hold
/// `Arc<dyn HttpFetch>`.
pub trait HttpFetch: Send + Sync {
    /// Performs an HTTP GET request, returning the response body.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, FetchError>>;
}

/// Production transport backed by reqwest.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Creates a transport with a 30 second request timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(30)
    }

    /// Creates a transport with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Http(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetch {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, FetchError>> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Http(format!("request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| FetchError::Http(format!("failed to read response: {}", e)))
        })
    }
}

/// Flatfile endpoint URL construction.
pub mod endpoints {
    use super::QuadKey;

    /// Host serving the imagery database.
    pub const EARTH_HOST: &str = "https://kh.google.com";

    /// Host serving the historical database.
    pub const HISTORY_HOST: &str = "https://khmdb.google.com";

    /// Database tag selecting the historical (time machine) database.
    pub const HISTORY_DB: &str = "tm";

    /// Imagery quadtree packet: `q2-{address}-q.{version}`.
    pub fn qtree_packet(address: &QuadKey, version: u16) -> String {
        format!("{EARTH_HOST}/flatfile?q2-{address}-q.{version}")
    }

    /// Imagery tile: `f1-{key}-i.{version}`.
    pub fn tile(key: &QuadKey, version: u16) -> String {
        format!("{EARTH_HOST}/flatfile?f1-{key}-i.{version}")
    }

    /// Historical quadtree packet: `qp-{address}-q.{version}` under the
    /// `db=tm` tag.
    pub fn history_packet(address: &QuadKey, version: u16) -> String {
        format!("{HISTORY_HOST}/flatfile?db={HISTORY_DB}&qp-{address}-q.{version}")
    }

    /// Historical tile: the imagery tile key with a literal date string
    /// appended.
    pub fn history_tile(key: &QuadKey, version: u16, date: &str) -> String {
        format!("{HISTORY_HOST}/flatfile?db={HISTORY_DB}&f1-{key}-i.{version}-{date}")
    }

    /// Root metadata document of the imagery database.
    pub fn dbroot() -> String {
        format!("{EARTH_HOST}/dbRoot.v5?hl=en&gl=us")
    }

    /// Root metadata document of the historical database.
    pub fn history_dbroot() -> String {
        format!("{HISTORY_HOST}/dbRoot.v5?db={HISTORY_DB}&hl=en&gl=us")
    }
}
