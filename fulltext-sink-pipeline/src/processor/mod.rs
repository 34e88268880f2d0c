//! Processor module for the sink pipeline.
//!
//! Maps key/value mutations onto documents of the full-text indexes
//! defined on the affected tag or edge type.

mod extractor;
mod keys;
mod schema;

pub use extractor::{DocOp, Document, DocumentExtractor};
pub use keys::{key_kind, EdgeKey, KeyKind, TagKey};
pub use schema::{PropertyValue, Row, RowDecoder, SchemaKind, SchemaLookup, VidLayout, VidType};

#[cfg(test)]
pub(crate) use extractor::tests::{MockSchema, TextRowDecoder};
