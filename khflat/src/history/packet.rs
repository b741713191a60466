//! Schema decode of historical quadtree packets.
//!
//! Field numbers follow the keyhole quadtree-set schema
//! (`quadtreeset.protodevel` in the Earth Enterprise client sources):
//!
//! ```text
//! QuadtreePacket       { 1: packet_epoch, 2: sparse_quadtree_node* }
//! SparseQuadtreeNode   { 1: index, 2: node }
//! QuadtreeNode         { 1: flags, 2: cache_node_epoch, 3: layer*, 4: channel* }
//! QuadtreeLayer        { 1: type, 2: layer_epoch, 3: provider, 4: dates_layer }
//! QuadtreeImageryDates { 1: dated_tile*, 2: shared_tile_date, 3: coarse_tile_dates* }
//! QuadtreeDatedTile    { 1: date, 2: dated_tile_epoch, 3: provider }
//! ```
//!
//! Nodes that carry no layers are dropped during extraction, matching how
//! the upstream client flattens the sparse node list before tree
//! reconstruction.

use serde::Serialize;

use crate::error::DecodeError;
use crate::history::date::decode_packed_date;
use crate::history::wire::{WireReader, WIRE_LEN, WIRE_VARINT};
use crate::qtree::NodeFlags;

const PACKET_SPARSE_NODE: u32 = 2;
const SPARSE_NODE_NODE: u32 = 2;
const NODE_FLAGS: u32 = 1;
const NODE_LAYER: u32 = 3;
const LAYER_TYPE: u32 = 1;
const LAYER_EPOCH: u32 = 2;
const LAYER_DATES: u32 = 4;
const DATES_DATED_TILE: u32 = 1;
const DATES_SHARED: u32 = 2;
const DATES_COARSE: u32 = 3;
const DATED_DATE: u32 = 1;
const DATED_EPOCH: u32 = 2;
const DATED_PROVIDER: u32 = 3;

const LAYER_TYPE_IMAGERY: u64 = 0;
const LAYER_TYPE_TERRAIN: u64 = 1;
const LAYER_TYPE_VECTOR: u64 = 2;
const LAYER_TYPE_IMAGERY_HISTORY: u64 = 3;

/// One capture date in a tile's historical timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedTile {
    /// Packed date integer, see [`decode_packed_date`].
    pub date: u32,
    /// Internal revision counter for that date.
    #[serde(rename = "datedTileEpoch")]
    pub epoch: u32,
    /// Imagery provider identifier.
    pub provider: u32,
}

impl DatedTile {
    /// The capture date rendered as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        decode_packed_date(self.date)
    }
}

/// Per-tile imagery-date timeline of a historical layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatesLayer {
    /// Individual capture dates, oldest first as served.
    #[serde(rename = "datedTile")]
    pub dated_tiles: Vec<DatedTile>,
    /// Date shared by neighboring tiles, when the upstream collapses them.
    #[serde(rename = "sharedTileDate", skip_serializing_if = "Option::is_none")]
    pub shared_tile_date: Option<u32>,
    /// Summary dates of coarser levels.
    #[serde(rename = "coarseTileDates", skip_serializing_if = "Vec::is_empty")]
    pub coarse_tile_dates: Vec<u32>,
}

/// One layer entry of a historical node.
///
/// A tagged union on the wire; the historical variant is the only one
/// carrying a dates payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Layer {
    #[serde(rename = "LAYER_TYPE_IMAGERY")]
    Imagery {
        #[serde(rename = "layerEpoch")]
        epoch: u32,
    },
    #[serde(rename = "LAYER_TYPE_TERRAIN")]
    Terrain {
        #[serde(rename = "layerEpoch")]
        epoch: u32,
    },
    #[serde(rename = "LAYER_TYPE_VECTOR")]
    Vector {
        #[serde(rename = "layerEpoch")]
        epoch: u32,
    },
    #[serde(rename = "LAYER_TYPE_IMAGERY_HISTORY")]
    ImageryHistory {
        #[serde(rename = "layerEpoch")]
        epoch: u32,
        #[serde(rename = "datesLayer")]
        dates: DatesLayer,
    },
}

/// One node of a historical quadtree packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNode {
    /// Capability bitfield, same masks as the imagery variant.
    pub bitfield: u8,
    /// Layers present at this node.
    pub layers: Vec<Layer>,
}

impl NodeFlags for HistoryNode {
    fn bitfield(&self) -> u8 {
        self.bitfield
    }
}

/// Extracts the flat node sequence from a decoded historical packet.
///
/// Node order matches the traversal consumed by
/// [`crate::qtree::parse_qtree`]; nodes without layers are skipped.
pub fn get_history_nodes(packet: &[u8]) -> Result<Vec<HistoryNode>, DecodeError> {
    let mut reader = WireReader::new(packet);
    let mut nodes = Vec::new();

    while !reader.is_empty() {
        let (field, wire_type) = reader.field()?;
        match (field, wire_type) {
            (PACKET_SPARSE_NODE, WIRE_LEN) => {
                if let Some(node) = decode_sparse_node(reader.bytes()?)? {
                    nodes.push(node);
                }
            }
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(nodes)
}

fn decode_sparse_node(buf: &[u8]) -> Result<Option<HistoryNode>, DecodeError> {
    let mut reader = WireReader::new(buf);
    let mut node = None;

    while !reader.is_empty() {
        let (field, wire_type) = reader.field()?;
        match (field, wire_type) {
            (SPARSE_NODE_NODE, WIRE_LEN) => node = Some(decode_node(reader.bytes()?)?),
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(node.filter(|n| !n.layers.is_empty()))
}

fn decode_node(buf: &[u8]) -> Result<HistoryNode, DecodeError> {
    let mut reader = WireReader::new(buf);
    let mut bitfield = 0u8;
    let mut layers = Vec::new();

    while !reader.is_empty() {
        let (field, wire_type) = reader.field()?;
        match (field, wire_type) {
            (NODE_FLAGS, WIRE_VARINT) => bitfield = reader.varint()? as u8,
            (NODE_LAYER, WIRE_LEN) => layers.push(decode_layer(reader.bytes()?)?),
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(HistoryNode { bitfield, layers })
}

fn decode_layer(buf: &[u8]) -> Result<Layer, DecodeError> {
    let mut reader = WireReader::new(buf);
    let mut kind = LAYER_TYPE_IMAGERY;
    let mut epoch = 0u32;
    let mut dates: Option<DatesLayer> = None;

    while !reader.is_empty() {
        let (field, wire_type) = reader.field()?;
        match (field, wire_type) {
            (LAYER_TYPE, WIRE_VARINT) => kind = reader.varint()?,
            (LAYER_EPOCH, WIRE_VARINT) => epoch = reader.varint()? as u32,
            (LAYER_DATES, WIRE_LEN) => dates = Some(decode_dates_layer(reader.bytes()?)?),
            _ => reader.skip(wire_type)?,
        }
    }

    match kind {
        LAYER_TYPE_IMAGERY => Ok(Layer::Imagery { epoch }),
        LAYER_TYPE_TERRAIN => Ok(Layer::Terrain { epoch }),
        LAYER_TYPE_VECTOR => Ok(Layer::Vector { epoch }),
        LAYER_TYPE_IMAGERY_HISTORY => Ok(Layer::ImageryHistory {
            epoch,
            dates: dates.unwrap_or_default(),
        }),
        _ => Err(DecodeError::Wire("unknown layer type")),
    }
}

fn decode_dates_layer(buf: &[u8]) -> Result<DatesLayer, DecodeError> {
    let mut reader = WireReader::new(buf);
    let mut layer = DatesLayer::default();

    while !reader.is_empty() {
        let (field, wire_type) = reader.field()?;
        match (field, wire_type) {
            (DATES_DATED_TILE, WIRE_LEN) => {
                layer.dated_tiles.push(decode_dated_tile(reader.bytes()?)?);
            }
            (DATES_SHARED, WIRE_VARINT) => {
                layer.shared_tile_date = Some(reader.varint()? as u32);
            }
            (DATES_COARSE, WIRE_VARINT) => {
                layer.coarse_tile_dates.push(reader.varint()? as u32);
            }
            (DATES_COARSE, WIRE_LEN) => {
                // Packed encoding of the repeated field.
                let mut packed = WireReader::new(reader.bytes()?);
                while !packed.is_empty() {
                    layer.coarse_tile_dates.push(packed.varint()? as u32);
                }
            }
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(layer)
}

fn decode_dated_tile(buf: &[u8]) -> Result<DatedTile, DecodeError> {
    let mut reader = WireReader::new(buf);
    let mut tile = DatedTile {
        date: 0,
        epoch: 0,
        provider: 0,
    };

    while !reader.is_empty() {
        let (field, wire_type) = reader.field()?;
        match (field, wire_type) {
            (DATED_DATE, WIRE_VARINT) => tile.date = reader.varint()? as u32,
            (DATED_EPOCH, WIRE_VARINT) => tile.epoch = reader.varint()? as u32,
            (DATED_PROVIDER, WIRE_VARINT) => tile.provider = reader.varint()? as u32,
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(tile)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::history::wire::{put_bytes, put_key, put_varint};
    use crate::qtree::parse_qtree;
    use crate::quad::QuadKey;

    fn encode_varint_field(out: &mut Vec<u8>, field: u32, value: u64) {
        put_key(out, field, WIRE_VARINT);
        put_varint(out, value);
    }

    fn encode_dated_tile(tile: &DatedTile) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint_field(&mut out, DATED_DATE, u64::from(tile.date));
        encode_varint_field(&mut out, DATED_EPOCH, u64::from(tile.epoch));
        encode_varint_field(&mut out, DATED_PROVIDER, u64::from(tile.provider));
        out
    }

    fn encode_layer(layer: &Layer) -> Vec<u8> {
        let mut out = Vec::new();
        match layer {
            Layer::Imagery { epoch } => {
                encode_varint_field(&mut out, LAYER_TYPE, LAYER_TYPE_IMAGERY);
                encode_varint_field(&mut out, LAYER_EPOCH, u64::from(*epoch));
            }
            Layer::Terrain { epoch } => {
                encode_varint_field(&mut out, LAYER_TYPE, LAYER_TYPE_TERRAIN);
                encode_varint_field(&mut out, LAYER_EPOCH, u64::from(*epoch));
            }
            Layer::Vector { epoch } => {
                encode_varint_field(&mut out, LAYER_TYPE, LAYER_TYPE_VECTOR);
                encode_varint_field(&mut out, LAYER_EPOCH, u64::from(*epoch));
            }
            Layer::ImageryHistory { epoch, dates } => {
                encode_varint_field(&mut out, LAYER_TYPE, LAYER_TYPE_IMAGERY_HISTORY);
                encode_varint_field(&mut out, LAYER_EPOCH, u64::from(*epoch));
                let mut dates_buf = Vec::new();
                for tile in &dates.dated_tiles {
                    put_bytes(&mut dates_buf, DATES_DATED_TILE, &encode_dated_tile(tile));
                }
                if let Some(shared) = dates.shared_tile_date {
                    encode_varint_field(&mut dates_buf, DATES_SHARED, u64::from(shared));
                }
                for coarse in &dates.coarse_tile_dates {
                    encode_varint_field(&mut dates_buf, DATES_COARSE, u64::from(*coarse));
                }
                put_bytes(&mut out, LAYER_DATES, &dates_buf);
            }
        }
        out
    }

    /// Builds a decoded historical packet from `(bitfield, layers)` pairs,
    /// used here and by the engine tests.
    pub(crate) fn build_history_packet(nodes: &[(u8, Vec<Layer>)]) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint_field(&mut out, 1, 42); // packet_epoch, skipped by the decoder
        for (index, (bitfield, layers)) in nodes.iter().enumerate() {
            let mut node_buf = Vec::new();
            encode_varint_field(&mut node_buf, NODE_FLAGS, u64::from(*bitfield));
            for layer in layers {
                put_bytes(&mut node_buf, NODE_LAYER, &encode_layer(layer));
            }

            let mut sparse_buf = Vec::new();
            encode_varint_field(&mut sparse_buf, 1, index as u64);
            put_bytes(&mut sparse_buf, SPARSE_NODE_NODE, &node_buf);
            put_bytes(&mut out, PACKET_SPARSE_NODE, &sparse_buf);
        }
        out
    }

    fn history_layer(epoch: u32, dates: &[u32]) -> Layer {
        Layer::ImageryHistory {
            epoch,
            dates: DatesLayer {
                dated_tiles: dates
                    .iter()
                    .map(|&date| DatedTile {
                        date,
                        epoch: 1,
                        provider: 0,
                    })
                    .collect(),
                shared_tile_date: None,
                coarse_tile_dates: Vec::new(),
            },
        }
    }

    #[test]
    fn test_decodes_nodes_with_layers() {
        let packet = build_history_packet(&[
            (0x41, vec![Layer::Imagery { epoch: 3 }]),
            (0x40, vec![history_layer(5, &[1030756, 1036697])]),
        ]);

        let nodes = get_history_nodes(&packet).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].bitfield, 0x41);
        assert_eq!(nodes[0].layers, vec![Layer::Imagery { epoch: 3 }]);

        match &nodes[1].layers[0] {
            Layer::ImageryHistory { epoch, dates } => {
                assert_eq!(*epoch, 5);
                assert_eq!(dates.dated_tiles.len(), 2);
                assert_eq!(dates.dated_tiles[0].date_string(), "2013-03-04");
                assert_eq!(dates.dated_tiles[1].date_string(), "2024-12-25");
            }
            other => panic!("expected history layer, got {:?}", other),
        }
    }

    #[test]
    fn test_layerless_nodes_are_skipped() {
        let packet = build_history_packet(&[
            (0x0F, vec![]),
            (0x40, vec![Layer::Imagery { epoch: 1 }]),
        ]);
        let nodes = get_history_nodes(&packet).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].bitfield, 0x40);
    }

    #[test]
    fn test_shared_and_coarse_dates() {
        let layer = Layer::ImageryHistory {
            epoch: 2,
            dates: DatesLayer {
                dated_tiles: vec![DatedTile {
                    date: 545,
                    epoch: 271,
                    provider: 0,
                }],
                shared_tile_date: Some(1036610),
                coarse_tile_dates: vec![1016735],
            },
        };
        let packet = build_history_packet(&[(0x40, vec![layer.clone()])]);
        let nodes = get_history_nodes(&packet).unwrap();
        assert_eq!(nodes[0].layers[0], layer);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let mut packet = build_history_packet(&[(0x40, vec![Layer::Imagery { epoch: 1 }])]);
        // Trailing unknown varint field at the packet level.
        put_key(&mut packet, 15, WIRE_VARINT);
        put_varint(&mut packet, 999);
        assert_eq!(get_history_nodes(&packet).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_layer_type_is_fatal() {
        let mut layer_buf = Vec::new();
        encode_varint_field(&mut layer_buf, LAYER_TYPE, 7);
        let mut node_buf = Vec::new();
        encode_varint_field(&mut node_buf, NODE_FLAGS, 0x40);
        put_bytes(&mut node_buf, NODE_LAYER, &layer_buf);
        let mut sparse_buf = Vec::new();
        put_bytes(&mut sparse_buf, SPARSE_NODE_NODE, &node_buf);
        let mut packet = Vec::new();
        put_bytes(&mut packet, PACKET_SPARSE_NODE, &sparse_buf);

        assert!(matches!(
            get_history_nodes(&packet),
            Err(DecodeError::Wire(_))
        ));
    }

    #[test]
    fn test_truncated_packet_is_fatal() {
        let packet = build_history_packet(&[(0x40, vec![Layer::Imagery { epoch: 1 }])]);
        let truncated = &packet[..packet.len() - 3];
        assert!(get_history_nodes(truncated).is_err());
    }

    #[test]
    fn test_tree_reconstruction_over_history_nodes() {
        // The same traversal as the imagery variant, driven by the shared
        // bitfield: root with child 2 only.
        let packet = build_history_packet(&[
            (0x04, vec![Layer::Imagery { epoch: 1 }]),
            (0x00, vec![history_layer(9, &[1035062])]),
        ]);
        let nodes = get_history_nodes(&packet).unwrap();
        let root = QuadKey::from_digits("0210").unwrap();
        let map = parse_qtree(&nodes, Some(&root));

        let child = QuadKey::from_digits("02102").unwrap();
        let node = map[&child].as_ref().unwrap();
        match &node.layers[0] {
            Layer::ImageryHistory { dates, .. } => {
                assert_eq!(dates.dated_tiles[0].date_string(), "2021-09-22");
            }
            other => panic!("expected history layer, got {:?}", other),
        }
        assert_eq!(map[&QuadKey::from_digits("02100").unwrap()], None);
    }

    #[test]
    fn test_serializes_like_upstream_json() {
        let layer = history_layer(271, &[545]);
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "LAYER_TYPE_IMAGERY_HISTORY");
        assert_eq!(json["layerEpoch"], 271);
        assert_eq!(json["datesLayer"]["datedTile"][0]["date"], 545);
        assert_eq!(json["datesLayer"]["datedTile"][0]["datedTileEpoch"], 1);
    }
}
