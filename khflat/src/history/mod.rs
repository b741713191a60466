//! Historical-imagery packet decoding.
//!
//! The historical database serves the same quadtree coverage as the
//! imagery database, but its packets are a self-describing serialization
//! (protobuf wire format against the keyhole quadtree-set schema) instead
//! of fixed 32-byte records. Each node carries the familiar capability
//! bitfield plus a list of layers; historical layers hold per-tile
//! imagery-date timelines with dates packed into integers.
//!
//! Tree reconstruction is shared with the imagery variant through
//! [`crate::qtree::NodeFlags`] and [`crate::qtree::parse_qtree`].

mod date;
pub(crate) mod packet;
mod wire;

pub use date::decode_packed_date;
pub use packet::{get_history_nodes, DatedTile, DatesLayer, HistoryNode, Layer};
