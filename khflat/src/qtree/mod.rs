//! Quadtree packet codec and tree reconstruction.
//!
//! A quadtree packet is a flat binary blob describing a bounded region of
//! the 4-ary spatial tree: one root node plus up to 4 levels of
//! descendants. The wire format carries no tree shape of its own; the
//! node order is meaningful only under the exact depth-first traversal
//! implemented in [`parse_qtree`].

pub(crate) mod codec;
mod node;
mod tree;

pub use codec::{get_nodes_from_qtree, QTREE_MAGIC};
pub use node::{
    NodeFlags, TileNode, ANY_CHILD_MASK, CHILD_MASKS, IMAGERY_MASK, SUBTREE_MASK, TERRAIN_MASK,
};
pub use tree::{parse_qtree, CoverageMap};
