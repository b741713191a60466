//! Keystream decryption for flatfile payloads.
//!
//! Every payload served by the protocol (quadtree packets and image tiles
//! alike) is XORed against a fixed walk over the 1024-byte key delivered by
//! the root metadata document. The walk is not parametrized by payload
//! length or content; it must be reproduced bit-exactly or nothing else in
//! the protocol decodes.
//!
//! The cipher is an involution: applying [`decrypt`] twice with the same key
//! returns the original bytes. Tests and fixture builders rely on this.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::dbroot::KeyBundle;
use crate::error::DecodeError;

/// Marker prefixing encrypted image tiles: `07 91 EF A6`.
pub const TILE_MARKER: [u8; 4] = [0x07, 0x91, 0xEF, 0xA6];

/// Size of the unparsed sub-header between decryption and decompression
/// of a quadtree packet.
const PACKET_SUBHEADER_LEN: usize = 8;

/// Decrypts a flatfile payload with the protocol keystream.
///
/// The key index starts at 16 and advances by one per byte, skipping 16
/// ahead at every multiple of 8 and wrapping into `(index + 8) % 24` once
/// it reaches 1016. Each output byte is the input byte XOR
/// `key[index + 8]`.
///
/// Empty input yields empty output. There are no error conditions.
pub fn decrypt(payload: &[u8], key: &KeyBundle) -> Vec<u8> {
    let key = key.as_bytes();
    let mut out = Vec::with_capacity(payload.len());
    let mut key_index: usize = 16;

    for &byte in payload {
        out.push(byte ^ key[key_index + 8]);
        key_index += 1;
        if key_index % 8 == 0 {
            key_index += 16;
        }
        if key_index >= 1016 {
            key_index = (key_index + 8) % 24;
        }
    }
    out
}

/// Decrypts an image tile payload.
///
/// Returns `None` if the payload does not begin with [`TILE_MARKER`]. A
/// missing marker is a normal outcome (the upstream serves unmarked bytes
/// for tiles it does not have), not a format error; callers fall back to a
/// placeholder.
pub fn decode_tile(payload: &[u8], key: &KeyBundle) -> Option<Vec<u8>> {
    if payload.len() >= TILE_MARKER.len() && payload[..TILE_MARKER.len()] == TILE_MARKER {
        Some(decrypt(payload, key))
    } else {
        None
    }
}

/// Decodes a quadtree packet payload: decrypt, skip the 8-byte sub-header,
/// then zlib-inflate the remainder.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the decrypted buffer is shorter
/// than the sub-header, or [`DecodeError::Inflate`] if decompression fails.
pub fn decode_qtree_packet(payload: &[u8], key: &KeyBundle) -> Result<Vec<u8>, DecodeError> {
    let inner = decrypt(payload, key);
    if inner.len() < PACKET_SUBHEADER_LEN {
        return Err(DecodeError::Truncated { len: inner.len() });
    }

    let mut decoder = ZlibDecoder::new(&inner[PACKET_SUBHEADER_LEN..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
