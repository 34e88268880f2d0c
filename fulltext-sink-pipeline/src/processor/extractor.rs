//! Document extractor.
//!
//! Turns one key/value mutation into zero or more documents, one per
//! full-text index defined on the mutated tag or edge type.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::consumer::{Mutation, MutationBatch};
use crate::errors::PipelineError;
use crate::processor::keys::{key_kind, EdgeKey, KeyKind, TagKey};
use crate::processor::schema::{PropertyValue, Row, RowDecoder, SchemaKind, SchemaLookup, VidLayout};
use fulltext_sink_repository::{BulkBatch, DocKey};
use fulltext_sink_shared::{IndexDescriptor, SchemaId};

/// Whether a document is written or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocOp {
    Put,
    Delete,
}

/// One document-level change for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub op: DocOp,
    pub index: String,
    pub key: DocKey,
    /// Indexed fields; empty for deletes.
    pub fields: BTreeMap<String, String>,
}

/// Maps mutations onto documents.
pub struct DocumentExtractor {
    schema: Arc<dyn SchemaLookup>,
    decoder: Arc<dyn RowDecoder>,
    vid_layout: VidLayout,
}

impl DocumentExtractor {
    pub fn new(
        schema: Arc<dyn SchemaLookup>,
        decoder: Arc<dyn RowDecoder>,
        vid_layout: VidLayout,
    ) -> Self {
        Self {
            schema,
            decoder,
            vid_layout,
        }
    }

    /// Add the documents of every mutation in `batch` to `bulk`.
    ///
    /// Returns the number of documents added.
    #[instrument(skip_all, fields(mutations = batch.len()))]
    pub fn extract_into(&self, batch: &MutationBatch, bulk: &mut BulkBatch) -> usize {
        let mut documents = 0;
        for mutation in batch {
            self.extract(mutation, |doc| {
                documents += 1;
                match doc.op {
                    DocOp::Put => bulk.put(&doc.index, &doc.key, doc.fields),
                    DocOp::Delete => bulk.delete(&doc.index, &doc.key),
                }
            });
        }
        debug!(documents = documents, "Extracted documents");
        documents
    }

    /// Call `emit` once per document produced by `mutation`.
    ///
    /// Mutations on keys without full-text indexes produce nothing. Decode
    /// failures are logged and the mutation is dropped.
    pub fn extract(&self, mutation: &Mutation, emit: impl FnMut(Document)) {
        let result = match mutation {
            Mutation::Put { key, value } => self.extract_key(key, Some(value), emit),
            Mutation::Remove { key } => self.extract_key(key, None, emit),
            Mutation::RemoveRange { start, end } => {
                warn!(
                    start_len = start.len(),
                    end_len = end.len(),
                    "Range removes are not mirrored to full-text indexes"
                );
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "Dropping mutation that could not be extracted");
        }
    }

    fn extract_key(
        &self,
        key: &[u8],
        value: Option<&Vec<u8>>,
        mut emit: impl FnMut(Document),
    ) -> Result<(), PipelineError> {
        let (kind, schema_id, doc_key) = match key_kind(key) {
            KeyKind::Tag => {
                let tag = TagKey::parse(key, self.vid_layout.len)?;
                let vid = self.vid_layout.render(tag.vid);
                (SchemaKind::Tag, tag.tag_id, DocKey::vertex(vid))
            }
            KeyKind::Edge => {
                let edge = EdgeKey::parse(key, self.vid_layout.len)?;
                if edge.is_reverse() {
                    return Ok(());
                }
                let src = self.vid_layout.render(edge.src);
                let dst = self.vid_layout.render(edge.dst);
                (SchemaKind::Edge, edge.edge_type, DocKey::edge(src, dst, edge.rank))
            }
            KeyKind::Other => return Ok(()),
        };

        let indexes = self.schema.fulltext_indexes(kind, schema_id)?;
        if indexes.is_empty() {
            return Ok(());
        }

        match value {
            Some(raw) => {
                let row = self.decoder.decode(kind, schema_id, raw)?;
                for index in &indexes {
                    emit(Document {
                        op: DocOp::Put,
                        index: index.name.clone(),
                        key: doc_key.clone(),
                        fields: Self::fields(index, &row, schema_id),
                    });
                }
            }
            None => {
                for index in &indexes {
                    emit(Document {
                        op: DocOp::Delete,
                        index: index.name.clone(),
                        key: doc_key.clone(),
                        fields: BTreeMap::new(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Indexed fields of `row`. Values that are not strings become empty.
    fn fields(index: &IndexDescriptor, row: &Row, schema_id: SchemaId) -> BTreeMap<String, String> {
        index
            .fields
            .iter()
            .map(|field| {
                let text = match row.get(field) {
                    Some(PropertyValue::String(s)) => s.clone(),
                    Some(PropertyValue::Null) | None => String::new(),
                    Some(other) => {
                        warn!(
                            index = %index.name,
                            schema_id = schema_id,
                            field = %field,
                            value = ?other,
                            "Full-text field is not a string"
                        );
                        String::new()
                    }
                };
                (field.clone(), text)
            })
            .collect()
    }
}
