//! Fixed-offset packet codec for imagery quadtree packets.

use bytes::Buf;

use crate::error::DecodeError;
use crate::qtree::node::{TileNode, NODE_RECORD_LEN};

/// Magic bytes at offset 0 of a decoded quadtree packet: `2D 7E 00 00`.
pub const QTREE_MAGIC: [u8; 4] = [0x2D, 0x7E, 0x00, 0x00];

/// Byte offset of the little-endian u32 instance count.
const NUM_INSTANCES_OFFSET: usize = 12;

/// Byte offset of the first node record. Record `i` (1-indexed) occupies
/// bytes `[32*i, 32*i + 32)`, so the packet header occupies one record slot.
const RECORDS_OFFSET: usize = 32;

/// Parses a decoded packet buffer into its flat node sequence, in file
/// order.
///
/// Index 0 of the result is the packet's own root node; the rest are
/// descendants in the traversal order consumed by
/// [`super::parse_qtree`].
///
/// # Errors
///
/// - [`DecodeError::BadMagic`] if the buffer does not start with
///   [`QTREE_MAGIC`]
/// - [`DecodeError::Truncated`] if the header is incomplete
/// - [`DecodeError::InvalidNode`] if a declared record extends past the
///   buffer
pub fn get_nodes_from_qtree(packet: &[u8]) -> Result<Vec<TileNode>, DecodeError> {
    if packet.len() < NUM_INSTANCES_OFFSET + 4 {
        return Err(DecodeError::Truncated { len: packet.len() });
    }
    if packet[..4] != QTREE_MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(&packet[..4]);
        return Err(DecodeError::BadMagic { found });
    }

    let num_instances = (&packet[NUM_INSTANCES_OFFSET..]).get_u32_le() as usize;

    let mut nodes = Vec::with_capacity(num_instances);
    for i in 1..=num_instances {
        let start = RECORDS_OFFSET + NODE_RECORD_LEN * (i - 1);
        let end = start + NODE_RECORD_LEN;
        if end > packet.len() {
            return Err(DecodeError::InvalidNode {
                len: packet.len().saturating_sub(start),
            });
        }
        nodes.push(TileNode::parse(&packet[start..end])?);
    }
    Ok(nodes)
}
