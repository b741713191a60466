//! Decode error types shared by the packet codecs.
//!
//! Format errors are fatal for the current decode and are surfaced to the
//! caller as typed failures, never silently substituted. Expected outcomes
//! (a quadrant key absent from a coverage map, a tile response without the
//! encryption marker) are modelled as `None`, not as errors.

use thiserror::Error;

/// Errors raised while decoding a quadtree packet or node record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The decoded buffer does not start with the quadtree packet magic.
    #[error("not a quadtree packet (magic {found:02X?})")]
    BadMagic { found: [u8; 4] },

    /// The buffer is too short to hold the declared structure.
    #[error("packet truncated at {len} bytes")]
    Truncated { len: usize },

    /// A node record slice was not exactly 32 bytes.
    #[error("invalid node record: expected 32 bytes, got {len}")]
    InvalidNode { len: usize },

    /// Decompression of the packet body failed.
    #[error("packet decompression failed: {0}")]
    Inflate(#[from] std::io::Error),

    /// The self-describing node list could not be deserialized.
    #[error("malformed packet schema: {0}")]
    Wire(&'static str),
}
