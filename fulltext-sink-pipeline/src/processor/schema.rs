//! Schema collaborators consumed by the extractor.

use std::collections::HashMap;

use crate::errors::PipelineError;
use fulltext_sink_shared::{IndexDescriptor, SchemaId};

/// Whether a schema id names a tag or an edge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Tag,
    Edge,
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Property values of one row, by property name.
pub type Row = HashMap<String, PropertyValue>;

/// Resolves the full-text indexes defined on a tag or edge type.
pub trait SchemaLookup: Send + Sync {
    /// Indexes covering `schema_id`; empty when there are none.
    fn fulltext_indexes(
        &self,
        kind: SchemaKind,
        schema_id: SchemaId,
    ) -> Result<Vec<IndexDescriptor>, PipelineError>;
}

/// Decodes an encoded row of a tag or edge type.
pub trait RowDecoder: Send + Sync {
    fn decode(&self, kind: SchemaKind, schema_id: SchemaId, raw: &[u8]) -> Result<Row, PipelineError>;
}

/// How vertex ids are stored in keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VidType {
    /// `i64 LE`, rendered in decimal.
    Int64,
    /// Fixed-width string padded with NUL bytes.
    FixedString,
}

/// Vertex id width and type of a graph space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VidLayout {
    pub len: usize,
    pub vid_type: VidType,
}

impl VidLayout {
    pub fn int64() -> Self {
        Self {
            len: 8,
            vid_type: VidType::Int64,
        }
    }

    pub fn fixed_string(len: usize) -> Self {
        Self {
            len,
            vid_type: VidType::FixedString,
        }
    }

    /// Text form of a vid as stored in a key.
    pub fn render(&self, raw: &[u8]) -> String {
        match self.vid_type {
            VidType::Int64 if raw.len() >= 8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&raw[..8]);
                i64::from_le_bytes(buf).to_string()
            }
            _ => {
                let end = raw.iter().rposition(|b| *b != 0).map_or(0, |at| at + 1);
                String::from_utf8_lossy(&raw[..end]).into_owned()
            }
        }
    }
}
