//! Full-text index descriptors.

use serde::{Deserialize, Serialize};

/// Tag id (vertex type) or edge type a full-text index is defined on.
pub type SchemaId = i32;

/// A full-text index defined on one tag or edge schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name in the search cluster.
    pub name: String,
    /// Tag or edge type the index covers.
    pub schema_id: SchemaId,
    /// Property names copied into each document.
    pub fields: Vec<String>,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, schema_id: SchemaId, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            schema_id,
            fields,
        }
    }
}
