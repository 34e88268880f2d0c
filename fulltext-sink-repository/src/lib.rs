//! # Full-text Sink Repository
//!
//! This crate provides the pieces that talk to the search cluster: a
//! protocol client that normalises every response into a result or a
//! [`SearchError`], a bulk accumulator that renders mutations as NDJSON, and
//! an index adapter implementing [`SearchEngineClient`] on top of them.
//! Network access goes through the [`HttpTransport`] trait so the whole
//! stack can be exercised without a live cluster.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use config::TransportConfig;
pub use errors::SearchError;
pub use interfaces::{
    EndpointSelector, HttpMethod, HttpRequest, HttpResponse, HttpTransport, RandomSelector,
    SearchEngineClient,
};
pub use opensearch::{
    BulkAction, BulkBatch, DocKey, EsAdapter, EsClient, OpenSearchTransport, SearchOptions,
};
pub use types::Endpoint;
