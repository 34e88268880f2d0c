//! Bulk accumulator.
//!
//! Collects index and delete actions grouped by target index and renders
//! them as the newline-delimited body of a `_bulk` request.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use serde_json::{json, Map, Value};

/// Deterministic document id: lowercase hex md5 of `raw`.
pub fn document_id(raw: &str) -> String {
    format!("{:x}", Md5::digest(raw.as_bytes()))
}

/// Document id of an edge, hashed over `src ++ dst ++ decimal(rank)`.
pub fn edge_document_id(src: &str, dst: &str, rank: i64) -> String {
    document_id(&format!("{}{}{}", src, dst, rank))
}

/// Identity of the graph element a document mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocKey {
    Vertex(String),
    Edge { src: String, dst: String, rank: i64 },
}

impl DocKey {
    pub fn vertex(vid: impl Into<String>) -> Self {
        Self::Vertex(vid.into())
    }

    pub fn edge(src: impl Into<String>, dst: impl Into<String>, rank: i64) -> Self {
        Self::Edge {
            src: src.into(),
            dst: dst.into(),
            rank,
        }
    }

    /// Id shared by every action on this element.
    pub fn id(&self) -> String {
        match self {
            Self::Vertex(vid) => document_id(vid),
            Self::Edge { src, dst, rank } => edge_document_id(src, dst, *rank),
        }
    }

    /// Write all four identity fields; those of the other kind are left
    /// empty (`""`, rank `0`).
    fn write_identity(&self, doc: &mut Map<String, Value>) {
        let (vid, src, dst, rank) = match self {
            Self::Vertex(vid) => (vid.as_str(), "", "", 0),
            Self::Edge { src, dst, rank } => ("", src.as_str(), dst.as_str(), *rank),
        };
        doc.insert("vid".to_string(), json!(vid));
        doc.insert("src".to_string(), json!(src));
        doc.insert("dst".to_string(), json!(dst));
        doc.insert("rank".to_string(), json!(rank));
    }
}

/// One entry of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    /// Create or replace a document.
    Index { id: String, document: Value },
    /// Remove a document. Removing a missing document is not an error.
    Delete { id: String },
}

/// Ordered actions per target index.
///
/// Actions keep their insertion order within an index. Repeated actions on
/// the same id are kept; the cluster applies them in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkBatch {
    actions: BTreeMap<String, Vec<BulkAction>>,
}

impl BulkBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an index action carrying the element identity and `fields`.
    pub fn put(&mut self, index: &str, key: &DocKey, fields: BTreeMap<String, String>) {
        let mut doc = Map::new();
        key.write_identity(&mut doc);
        for (name, value) in fields {
            doc.insert(name, Value::String(value));
        }
        self.push(
            index,
            BulkAction::Index {
                id: key.id(),
                document: Value::Object(doc),
            },
        );
    }

    /// Queue a delete action for the element.
    pub fn delete(&mut self, index: &str, key: &DocKey) {
        self.push(index, BulkAction::Delete { id: key.id() });
    }

    fn push(&mut self, index: &str, action: BulkAction) {
        self.actions
            .entry(index.to_string())
            .or_default()
            .push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.values().all(Vec::is_empty)
    }

    /// Number of queued actions across all indexes.
    pub fn len(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }

    /// Queued actions for `index`, in insertion order.
    pub fn actions(&self, index: &str) -> &[BulkAction] {
        self.actions.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render the NDJSON request body, one trailing newline per line.
    pub fn to_ndjson(&self) -> String {
        let mut body = String::new();
        for (index, actions) in &self.actions {
            for action in actions {
                match action {
                    BulkAction::Index { id, document } => {
                        let header = json!({
                            "index": { "_id": id, "_type": "_doc", "_index": index }
                        });
                        body.push_str(&header.to_string());
                        body.push('\n');
                        body.push_str(&document.to_string());
                        body.push('\n');
                    }
                    BulkAction::Delete { id } => {
                        let header = json!({ "delete": { "_id": id, "_index": index } });
                        body.push_str(&header.to_string());
                        body.push('\n');
                    }
                }
            }
        }
        body
    }
}
