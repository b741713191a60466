//! Quadrant-key addressing.
//!
//! The protocol addresses space with strings over `{'0'..'3'}`: a constant
//! leading `'0'` for level 0, then one digit per subdivision level. The
//! subdivision square is lat in [-180, 180] x lon in [-180, 180] - a
//! degenerate doubling of the latitude range that is preserved exactly
//! because it is the protocol's native addressing space, not a geographic
//! projection.
//!
//! Packets of tree metadata exist only at levels {0, 3, 7, 11, 15, 19}.
//! [`QuadKey::packet_address`] maps any key to the address of the packet
//! that carries its metadata.

use std::fmt;

use thiserror::Error;

/// Subdivision levels at which quadtree packets exist.
pub const PACKET_LEVELS: [usize; 6] = [0, 3, 7, 11, 15, 19];

/// Errors raised when constructing a [`QuadKey`] from untrusted digits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuadKeyError {
    /// The key string was empty.
    #[error("empty quadrant key")]
    Empty,

    /// The key did not start with the constant level-0 digit `'0'`.
    #[error("quadrant key must start with '0', got {0:?}")]
    BadRoot(char),

    /// A character outside `'0'..='3'` appeared in the key.
    #[error("invalid quadrant digit {digit:?} at position {position}")]
    BadDigit { digit: char, position: usize },
}

/// A quadrant key: the sequence of quadrant choices from the tree root.
///
/// Constructed either from a literal digit string
/// ([`QuadKey::from_digits`]) or from tile coordinates
/// ([`QuadKey::from_xyz`]); both yield the same opaque type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuadKey(String);

impl QuadKey {
    /// Validates and wraps a quadrant-key string.
    pub fn from_digits(digits: &str) -> Result<Self, QuadKeyError> {
        let mut chars = digits.chars();
        match chars.next() {
            None => return Err(QuadKeyError::Empty),
            Some('0') => {}
            Some(other) => return Err(QuadKeyError::BadRoot(other)),
        }
        for (position, digit) in chars.enumerate() {
            if !('0'..='3').contains(&digit) {
                return Err(QuadKeyError::BadDigit {
                    digit,
                    position: position + 1,
                });
            }
        }
        Ok(Self(digits.to_string()))
    }

    /// Builds the quadrant key covering tile `(x, y)` at zoom `z`.
    ///
    /// Subdivision is driven by the tile's *center* coordinate. Using the
    /// corner is numerically unstable: a corner sits exactly on quadrant
    /// boundaries and floating-point error can flip the digit choice.
    pub fn from_xyz(x: u32, y: u32, z: u8) -> Self {
        let (lat, lon) = tile_center(x, y, z);
        Self::from_lat_lon(lat, lon, z)
    }

    /// Builds the quadrant key containing `(lat, lon)` at `depth`
    /// subdivision levels, in the protocol's addressing square.
    pub fn from_lat_lon(lat: f64, lon: f64, depth: u8) -> Self {
        let mut code = String::with_capacity(depth as usize + 1);
        code.push('0');

        // Current region, top-left (lat1, lon1) to bottom-right (lat2, lon2).
        let mut lat1 = 180.0_f64;
        let mut lon1 = -180.0_f64;
        let mut lat2 = -180.0_f64;
        let mut lon2 = 180.0_f64;

        for _ in 0..depth {
            let mid_lat = (lat1 + lat2) / 2.0;
            let mid_lon = (lon1 + lon2) / 2.0;

            if lat >= mid_lat && lon < mid_lon {
                code.push('3');
                lat2 = mid_lat;
                lon2 = mid_lon;
            } else if lat >= mid_lat {
                code.push('2');
                lat2 = mid_lat;
                lon1 = mid_lon;
            } else if lon >= mid_lon {
                code.push('1');
                lat1 = mid_lat;
                lon1 = mid_lon;
            } else {
                code.push('0');
                lat1 = mid_lat;
                lon2 = mid_lon;
            }
        }
        Self(code)
    }

    /// Wraps a key built internally from trusted digits.
    pub(crate) fn from_trusted(digits: String) -> Self {
        debug_assert!(digits.bytes().all(|b| (b'0'..=b'3').contains(&b)));
        Self(digits)
    }

    /// The key as its digit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Subdivision level of the node this key names (length minus one).
    pub fn level(&self) -> usize {
        self.0.len() - 1
    }

    /// The address of the quadtree packet that carries this key's metadata.
    ///
    /// Packets exist at the levels in [`PACKET_LEVELS`]; the covering packet
    /// is rooted at the greatest such level *strictly below* this key's
    /// level. A key sitting exactly on a packet level still resolves to the
    /// previous one: a packet's root record carries no subtree data for
    /// itself, so its metadata lives one packet up. Protocol quirk, not a
    /// bug.
    pub fn packet_address(&self) -> QuadKey {
        let level = self.level();
        let boundary = PACKET_LEVELS
            .iter()
            .copied()
            .filter(|&p| p < level)
            .max()
            .unwrap_or(0);
        Self(self.0[..boundary + 1].to_string())
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Center coordinate of tile `(x, y)` at zoom `z`, as `(lat, lon)` degrees.
pub fn tile_center(x: u32, y: u32, z: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(z as i32);
    let half = 2.0_f64.powi(z as i32 - 1);

    let lon = (x as f64) * 360.0 / n - 180.0;
    let d_lon = 360.0 / n;
    let lat = 90.0 - (y as f64) * 180.0 / half;
    let d_lat = 180.0 / half;

    (lat - d_lat / 2.0, lon + d_lon / 2.0)
}

/// Tile column and row containing `(lat, lon)` at `zoom`.
pub fn coord_to_xyz(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let x = (2.0_f64.powi(zoom as i32) * (180.0 + lon) / 360.0).floor();
    let y = (2.0_f64.powi(zoom as i32 - 1) * (90.0 - lat) / 180.0).floor();
    (x as u32, y as u32)
}
