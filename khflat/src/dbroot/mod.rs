//! Root metadata document parsing.
//!
//! The upstream "dbRoot" document supplies the two pieces of state every
//! other decode needs: the current protocol version and the 1024-byte
//! decryption key. The imagery and historical databases publish separate
//! documents (the historical one behind the `db=tm` tag); both share the
//! same layout.
//!
//! Layout, bit-exact:
//! - bytes `[6, 8)`: little-endian u16 which XORed with `0x4200` yields the
//!   protocol version
//! - bytes `[8, 1024)`: key material, copied into key bytes `[8, 1024)`;
//!   key bytes `[0, 8)` are zero

use std::fmt;

use thiserror::Error;

/// Length of the decryption key buffer.
pub const KEY_LEN: usize = 1024;

/// Version obfuscation mask applied to bytes `[6, 8)` of the document.
const VERSION_MASK: u16 = 0x4200;

/// Number of leading key bytes that are always zero.
const KEY_ZERO_PREFIX: usize = 8;

/// Errors raised while parsing a root metadata document.
#[derive(Debug, Error)]
pub enum DbRootError {
    /// The document is shorter than the fixed 1024-byte layout requires.
    #[error("root metadata document too short: {len} bytes (need {KEY_LEN})")]
    TooShort { len: usize },
}

/// The 1024-byte decryption key extracted from a root metadata document.
///
/// Opaque on purpose: the only consumers are the cipher functions in
/// [`crate::crypt`], which index into the raw bytes.
#[derive(Clone)]
pub struct KeyBundle([u8; KEY_LEN]);

impl KeyBundle {
    /// Wraps raw key bytes, e.g. loaded from a previously saved key file.
    pub fn from_raw(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1024 bytes of key material are noise in logs.
        write!(f, "KeyBundle({} bytes)", KEY_LEN)
    }
}

/// Protocol version plus decryption key, as parsed from one document.
#[derive(Debug, Clone)]
pub struct DbRoot {
    /// Current protocol version for the database the document describes.
    pub version: u16,
    /// Decryption key for all payloads of that database.
    pub key: KeyBundle,
}

/// Extracts the protocol version from a root metadata document.
///
/// Usable on its own for the historical database, where only the version is
/// needed to address packets (the key is shared with the imagery document).
pub fn parse_version(data: &[u8]) -> Result<u16, DbRootError> {
    if data.len() < 8 {
        return Err(DbRootError::TooShort { len: data.len() });
    }
    let obfuscated = u16::from_le_bytes([data[6], data[7]]);
    Ok(obfuscated ^ VERSION_MASK)
}

/// Parses a full root metadata document into version and key.
pub fn parse_dbroot(data: &[u8]) -> Result<DbRoot, DbRootError> {
    if data.len() < KEY_LEN {
        return Err(DbRootError::TooShort { len: data.len() });
    }
    let version = parse_version(data)?;

    let mut key = [0u8; KEY_LEN];
    key[KEY_ZERO_PREFIX..].copy_from_slice(&data[KEY_ZERO_PREFIX..KEY_LEN]);
    Ok(DbRoot {
        version,
        key: KeyBundle::from_raw(key),
    })
}
