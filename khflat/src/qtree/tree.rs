//! Reconstruction of the 4-ary tree implied by a packet's node order.
//!
//! The wire format carries no self-describing tree shape. Nodes are laid
//! out in exact left-to-right, depth-first, digit-ascending (0,1,2,3)
//! order, and the only valid interpretation is to replay that traversal
//! with a single forward cursor shared across the whole recursion. The
//! cursor is threaded through calls explicitly rather than captured, so
//! the traversal stays a pure function of its inputs.

use std::collections::HashMap;

use tracing::warn;

use crate::qtree::node::NodeFlags;
use crate::quad::QuadKey;

/// Mapping from every quadrant key in a packet's coverage to its node, or
/// `None` where the protocol declares the quadrant absent.
pub type CoverageMap<N> = HashMap<QuadKey, Option<N>>;

/// Levels of descendants a single packet covers below its root.
const PACKET_DEPTH: u8 = 4;

/// Rebuilds the coverage map of one packet from its flat node sequence.
///
/// `root` is the packet address the sequence covers; `None` is the
/// top-of-hierarchy sentinel, where the first record acts as an implicit
/// level-1 ancestor that is not itself addressable.
///
/// A packet whose node sequence runs out mid-traversal ("instance count
/// mismatch") is logged and yields the partially populated map built so
/// far; callers must tolerate partial coverage.
pub fn parse_qtree<N>(nodes: &[N], root: Option<&QuadKey>) -> CoverageMap<N>
where
    N: NodeFlags + Clone,
{
    let mut map = CoverageMap::new();

    let Some(first) = nodes.first() else {
        warn!("quadtree packet contains no node records");
        return map;
    };
    let mut cursor = 1usize;

    match root {
        Some(root_key) => {
            map.insert(root_key.clone(), Some(first.clone()));
            populate(nodes, &mut cursor, &mut map, root_key.as_str(), first, 0);
        }
        None => {
            populate(nodes, &mut cursor, &mut map, "", first, 1);
        }
    }
    map
}

/// Visits the four children of `parent`, consuming records for the present
/// ones and recursing, in digit-ascending order.
fn populate<N>(
    nodes: &[N],
    cursor: &mut usize,
    map: &mut CoverageMap<N>,
    parent_key: &str,
    parent: &N,
    level: u8,
) where
    N: NodeFlags + Clone,
{
    // At the packet's depth limit a node without the subtree bit is a leaf:
    // its children are declared absent without consuming any records.
    let leaf = level == PACKET_DEPTH && !parent.has_subtree();

    for digit in 0..4u8 {
        let child_key = format!("{parent_key}{digit}");

        if leaf {
            map.insert(QuadKey::from_trusted(child_key), None);
        } else if level < PACKET_DEPTH {
            if !parent.has_child(digit as usize) {
                map.insert(QuadKey::from_trusted(child_key), None);
            } else {
                let Some(node) = nodes.get(*cursor) else {
                    warn!(
                        parent = %parent_key,
                        consumed = *cursor,
                        "instance count mismatch, returning partial coverage map"
                    );
                    return;
                };
                *cursor += 1;
                map.insert(QuadKey::from_trusted(child_key.clone()), Some(node.clone()));
                populate(nodes, cursor, map, &child_key, node, level + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qtree::node::{TileNode, SUBTREE_MASK};

    fn node(bitfield: u8, imagery_version: u16) -> TileNode {
        TileNode {
            bitfield,
            cnode_version: 0,
            imagery_version,
            terrain_version: 0,
        }
    }

    fn key(s: &str) -> QuadKey {
        QuadKey::from_digits(s).unwrap()
    }

    #[test]
    fn test_empty_sequence_yields_empty_map() {
        let map = parse_qtree::<TileNode>(&[], Some(&key("0")));
        assert!(map.is_empty());
    }

    #[test]
    fn test_childless_root() {
        let map = parse_qtree(&[node(0x40, 7)], Some(&key("0")));
        assert_eq!(map.len(), 5);
        assert_eq!(map[&key("0")].as_ref().unwrap().imagery_version, 7);
        for digit in ["00", "01", "02", "03"] {
            assert_eq!(map[&key(digit)], None);
        }
    }

    #[test]
    fn test_depth_first_digit_ascending_consumption() {
        // Root has children 0 and 2; child 0 has child 3. File order must
        // be: root, "00", "003", "02".
        let nodes = vec![
            node(0x01 | 0x04, 1), // root
            node(0x08, 2),        // "00"
            node(0x00, 3),        // "003"
            node(0x00, 4),        // "02"
        ];
        let map = parse_qtree(&nodes, Some(&key("0")));

        assert_eq!(map[&key("00")].as_ref().unwrap().imagery_version, 2);
        assert_eq!(map[&key("003")].as_ref().unwrap().imagery_version, 3);
        assert_eq!(map[&key("02")].as_ref().unwrap().imagery_version, 4);
        assert_eq!(map[&key("01")], None);
        assert_eq!(map[&key("03")], None);
    }

    #[test]
    fn test_root_packet_shape() {
        // Mirrors the observable shape of a live level-0 packet: rooted at
        // "0", keys "0000" and "0330" resolve to absent.
        let nodes = vec![
            node(0x01 | 0x08, 1), // root "0": children 0 and 3
            node(0x01, 2),        // "00": child 0
            node(0x00, 3),        // "000": no children
            node(0x08, 4),        // "03": child 3
            node(0x00, 5),        // "033": no children
        ];
        let map = parse_qtree(&nodes, Some(&key("0")));

        assert_eq!(map[&key("0000")], None);
        assert_eq!(map[&key("0330")], None);
        assert_eq!(map[&key("000")].as_ref().unwrap().imagery_version, 3);
        assert_eq!(map[&key("033")].as_ref().unwrap().imagery_version, 5);
    }

    #[test]
    fn test_leaf_at_depth_four_without_subtree() {
        // Chain of child-0 links down to level 4; the level-4 node has no
        // subtree bit, so its four children appear as absent.
        let nodes = vec![
            node(0x01, 0), // "0", level 0
            node(0x01, 1), // "00", level 1
            node(0x01, 2), // "000", level 2
            node(0x01, 3), // "0000", level 3
            node(0x00, 4), // "00000", level 4, leaf
        ];
        let map = parse_qtree(&nodes, Some(&key("0")));

        for digit in 0..4u8 {
            let child = format!("00000{digit}");
            assert_eq!(map[&key(&child)], None);
        }
    }

    #[test]
    fn test_subtree_bit_stops_expansion_at_depth_four() {
        // Same chain, but the level-4 node points at a deeper packet: its
        // children belong to that packet and must not appear here.
        let nodes = vec![
            node(0x01, 0),
            node(0x01, 1),
            node(0x01, 2),
            node(0x01, 3),
            node(SUBTREE_MASK, 4),
        ];
        let map = parse_qtree(&nodes, Some(&key("0")));

        assert!(map.contains_key(&key("00000")));
        for digit in 0..4u8 {
            let child = format!("00000{digit}");
            assert!(!map.contains_key(&key(&child)));
        }
    }

    #[test]
    fn test_instance_count_mismatch_returns_partial_map() {
        // Root declares child 0 but the sequence ends after the root.
        let nodes = vec![node(0x01, 1)];
        let map = parse_qtree(&nodes, Some(&key("0")));

        assert_eq!(map[&key("0")].as_ref().unwrap().imagery_version, 1);
        // The missing child is not recorded at all - neither present nor
        // absent.
        assert!(!map.contains_key(&key("00")));
    }

    #[test]
    fn test_top_of_hierarchy_sentinel() {
        // With no root key the first record is the implicit level-1
        // ancestor; recursion starts at level 1 and the ancestor itself is
        // not addressable.
        let nodes = vec![
            node(0x01, 0), // implicit ancestor: child 0 only
            node(0x02, 1), // "0": child 1
            node(0x00, 2), // "01"
        ];
        let map = parse_qtree(&nodes, None);

        assert_eq!(map[&key("0")].as_ref().unwrap().imagery_version, 1);
        assert_eq!(map[&key("01")].as_ref().unwrap().imagery_version, 2);
        assert_eq!(map[&key("00")], None);
        assert_eq!(map[&key("02")], None);
        assert_eq!(map[&key("03")], None);
    }

    #[test]
    fn test_coverage_count_for_full_two_levels() {
        // Root with all 4 children, none of which have children: map holds
        // the root, 4 present children, and 16 absent grandchildren.
        let mut nodes = vec![node(0x0F, 0)];
        nodes.extend((0..4).map(|i| node(0x00, i + 1)));
        let map = parse_qtree(&nodes, Some(&key("0")));
        assert_eq!(map.len(), 1 + 4 + 16);
    }
}
