//! OpenSearch implementation of the search engine client.
//!
//! This module provides the HTTP transport backed by the `opensearch`
//! crate, the per-member protocol client, the bulk accumulator, index
//! mappings and query builders, and the adapter implementing
//! `SearchEngineClient` on top of them.

mod adapter;
mod bulk;
mod client;
mod index_config;
pub mod queries;
mod transport;

pub use adapter::EsAdapter;
pub use bulk::{document_id, edge_document_id, BulkAction, BulkBatch, DocKey};
pub use client::EsClient;
pub use index_config::{index_mapping, EDGE_FIELDS, VERTEX_FIELDS};
pub use queries::SearchOptions;
pub use transport::OpenSearchTransport;
