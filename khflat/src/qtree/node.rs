//! Per-node metadata records and the shared capability bitfield.
//!
//! Both packet variants (fixed-offset imagery packets and the
//! self-describing historical packets) lead each node with the same one-byte
//! bitfield; the [`NodeFlags`] trait exposes it uniformly so tree
//! reconstruction works over either node kind.

use bytes::Buf;

use crate::error::DecodeError;

/// "Has child i" masks, one per quadrant digit.
pub const CHILD_MASKS: [u8; 4] = [0x01, 0x02, 0x04, 0x08];

/// Union of the four child masks.
pub const ANY_CHILD_MASK: u8 = 0x0F;

/// Set when a deeper subtree (another packet) hangs below this node.
pub const SUBTREE_MASK: u8 = 0x10;

/// Set when imagery exists for this node.
pub const IMAGERY_MASK: u8 = 0x40;

/// Set when terrain data exists for this node.
pub const TERRAIN_MASK: u8 = 0x80;

/// Capability bitfield shared by imagery and historical node kinds.
pub trait NodeFlags {
    /// The raw bitfield byte.
    fn bitfield(&self) -> u8;

    /// Whether child quadrant `index` (0..=3) is present in the packet.
    fn has_child(&self, index: usize) -> bool {
        self.bitfield() & CHILD_MASKS[index] != 0
    }

    /// Whether any child quadrant is present.
    fn has_children(&self) -> bool {
        self.bitfield() & ANY_CHILD_MASK != 0
    }

    /// Whether a deeper subtree hangs below this node.
    fn has_subtree(&self) -> bool {
        self.bitfield() & SUBTREE_MASK != 0
    }

    /// Whether imagery exists for this node.
    fn has_imagery(&self) -> bool {
        self.bitfield() & IMAGERY_MASK != 0
    }

    /// Whether terrain data exists for this node.
    fn has_terrain(&self) -> bool {
        self.bitfield() & TERRAIN_MASK != 0
    }
}

/// Size of one node record on the wire.
pub(crate) const NODE_RECORD_LEN: usize = 32;

/// One 32-byte node record of an imagery quadtree packet.
///
/// Little-endian fields at fixed offsets; the remaining bytes of the record
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileNode {
    /// Capability bitfield, see the mask constants in this module.
    pub bitfield: u8,
    /// Version of the cache node itself.
    pub cnode_version: u16,
    /// Imagery version, used to address the tile fetch.
    pub imagery_version: u16,
    /// Terrain version.
    pub terrain_version: u16,
}

impl TileNode {
    /// Parses one 32-byte record.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidNode`] if the slice is not exactly
    /// 32 bytes.
    pub fn parse(record: &[u8]) -> Result<Self, DecodeError> {
        if record.len() != NODE_RECORD_LEN {
            return Err(DecodeError::InvalidNode { len: record.len() });
        }
        let mut buf = record;
        let bitfield = buf.get_u8();
        buf.advance(1);
        let cnode_version = buf.get_u16_le();
        let imagery_version = buf.get_u16_le();
        let terrain_version = buf.get_u16_le();
        Ok(Self {
            bitfield,
            cnode_version,
            imagery_version,
            terrain_version,
        })
    }

    /// Serializes the record back to its 32-byte wire form.
    ///
    /// Bytes the parser ignores are written as zero. Used to build packet
    /// fixtures.
    pub fn to_bytes(&self) -> [u8; NODE_RECORD_LEN] {
        let mut out = [0u8; NODE_RECORD_LEN];
        out[0] = self.bitfield;
        out[2..4].copy_from_slice(&self.cnode_version.to_le_bytes());
        out[4..6].copy_from_slice(&self.imagery_version.to_le_bytes());
        out[6..8].copy_from_slice(&self.terrain_version.to_le_bytes());
        out
    }
}

impl NodeFlags for TileNode {
    fn bitfield(&self) -> u8 {
        self.bitfield
    }
}
