//! Storage key layout.
//!
//! Every key starts with a `u32 LE` header `(partition << 8) | key_type`.
//!
//! - tag key: `header | vid | i32 LE tag id`
//! - edge key: `header | src | i32 LE edge type | rank | dst | u8 version`
//!
//! Vertex ids occupy exactly the space's vid length. Ranks are stored
//! big-endian with the sign bit flipped so keys sort by rank.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::errors::PipelineError;
use fulltext_sink_shared::{PartitionId, SchemaId};

const HEADER_LEN: usize = 4;
const ID_LEN: usize = 4;
const RANK_LEN: usize = 8;
const VERSION_LEN: usize = 1;

const KEY_TYPE_TAG: u32 = 0x01;
const KEY_TYPE_EDGE: u32 = 0x02;

/// What a storage key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Tag,
    Edge,
    /// System, index or other keys with no full-text meaning.
    Other,
}

/// Classify a key by its header.
pub fn key_kind(key: &[u8]) -> KeyKind {
    if key.len() < HEADER_LEN {
        return KeyKind::Other;
    }
    match LittleEndian::read_u32(&key[..HEADER_LEN]) & 0xFF {
        KEY_TYPE_TAG => KeyKind::Tag,
        KEY_TYPE_EDGE => KeyKind::Edge,
        _ => KeyKind::Other,
    }
}

fn header(part: PartitionId, key_type: u32) -> [u8; HEADER_LEN] {
    ((part << 8) | key_type).to_le_bytes()
}

fn partition_of(key: &[u8]) -> PartitionId {
    LittleEndian::read_u32(&key[..HEADER_LEN]) >> 8
}

fn padded(vid: &[u8], vid_len: usize) -> Vec<u8> {
    let mut out = vid.to_vec();
    out.resize(vid_len, 0);
    out
}

/// Borrowed view of a tag key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagKey<'a> {
    pub part: PartitionId,
    pub vid: &'a [u8],
    pub tag_id: SchemaId,
}

impl<'a> TagKey<'a> {
    pub fn parse(key: &'a [u8], vid_len: usize) -> Result<Self, PipelineError> {
        let expected = HEADER_LEN + vid_len + ID_LEN;
        if key.len() != expected || key_kind(key) != KeyKind::Tag {
            return Err(PipelineError::decode(format!(
                "not a tag key: {} bytes, expected {}",
                key.len(),
                expected
            )));
        }
        let vid_end = HEADER_LEN + vid_len;
        Ok(Self {
            part: partition_of(key),
            vid: &key[HEADER_LEN..vid_end],
            tag_id: LittleEndian::read_i32(&key[vid_end..]),
        })
    }

    /// Build a tag key, padding `vid` to `vid_len` with NUL bytes.
    pub fn encode(part: PartitionId, vid: &[u8], vid_len: usize, tag_id: SchemaId) -> Vec<u8> {
        let mut key = header(part, KEY_TYPE_TAG).to_vec();
        key.extend_from_slice(&padded(vid, vid_len));
        key.extend_from_slice(&tag_id.to_le_bytes());
        key
    }
}

/// Borrowed view of an edge key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeKey<'a> {
    pub part: PartitionId,
    pub src: &'a [u8],
    /// Negative for the reverse copy stored with the destination vertex.
    pub edge_type: SchemaId,
    pub rank: i64,
    pub dst: &'a [u8],
}

impl<'a> EdgeKey<'a> {
    pub fn parse(key: &'a [u8], vid_len: usize) -> Result<Self, PipelineError> {
        let expected = HEADER_LEN + vid_len + ID_LEN + RANK_LEN + vid_len + VERSION_LEN;
        if key.len() != expected || key_kind(key) != KeyKind::Edge {
            return Err(PipelineError::decode(format!(
                "not an edge key: {} bytes, expected {}",
                key.len(),
                expected
            )));
        }
        let type_at = HEADER_LEN + vid_len;
        let rank_at = type_at + ID_LEN;
        let dst_at = rank_at + RANK_LEN;
        let rank_bits = BigEndian::read_u64(&key[rank_at..dst_at]) ^ (1u64 << 63);
        Ok(Self {
            part: partition_of(key),
            src: &key[HEADER_LEN..type_at],
            edge_type: LittleEndian::read_i32(&key[type_at..rank_at]),
            rank: rank_bits as i64,
            dst: &key[dst_at..dst_at + vid_len],
        })
    }

    /// Build an edge key, padding both vertex ids to `vid_len`.
    pub fn encode(
        part: PartitionId,
        src: &[u8],
        edge_type: SchemaId,
        rank: i64,
        dst: &[u8],
        vid_len: usize,
    ) -> Vec<u8> {
        let mut key = header(part, KEY_TYPE_EDGE).to_vec();
        key.extend_from_slice(&padded(src, vid_len));
        key.extend_from_slice(&edge_type.to_le_bytes());
        key.extend_from_slice(&((rank as u64) ^ (1u64 << 63)).to_be_bytes());
        key.extend_from_slice(&padded(dst, vid_len));
        key.push(1);
        key
    }

    pub fn is_reverse(&self) -> bool {
        self.edge_type < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_key() {
        let key = TagKey::encode(3, b"alice", 8, 7);
        assert_eq!(key.len(), 16);
        assert_eq!(key_kind(&key), KeyKind::Tag);

        let parsed = TagKey::parse(&key, 8).unwrap();
        assert_eq!(parsed.part, 3);
        assert_eq!(parsed.vid, b"alice\0\0\0");
        assert_eq!(parsed.tag_id, 7);
    }

    #[test]
    fn test_edge_key() {
        let key = EdgeKey::encode(1, b"a", -5, -42, b"b", 4);
        assert_eq!(key_kind(&key), KeyKind::Edge);

        let parsed = EdgeKey::parse(&key, 4).unwrap();
        assert_eq!(parsed.src, b"a\0\0\0");
        assert_eq!(parsed.dst, b"b\0\0\0");
        assert_eq!(parsed.edge_type, -5);
        assert_eq!(parsed.rank, -42);
        assert!(parsed.is_reverse());
    }

    #[test]
    fn test_rank_sorts_bytewise() {
        let low = EdgeKey::encode(1, b"a", 2, -1, b"b", 1);
        let high = EdgeKey::encode(1, b"a", 2, 1, b"b", 1);
        assert!(low < high);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let key = TagKey::encode(1, b"v", 8, 1);
        assert!(TagKey::parse(&key, 4).is_err());
        assert!(EdgeKey::parse(&key, 8).is_err());
        assert_eq!(key_kind(&[1, 2]), KeyKind::Other);
    }
}
