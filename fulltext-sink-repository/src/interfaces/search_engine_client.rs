//! Search engine client trait definition.
//!
//! This module defines the index-level operations the sink needs from a
//! full-text search cluster, independent of how requests reach it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::opensearch::BulkBatch;
use fulltext_sink_shared::QueryResult;

/// Abstract interface for full-text index operations.
///
/// The listener only depends on this trait, so tests can replace the
/// cluster with an in-memory mock.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// Every method returns `Result<T, SearchError>`. An application error
/// carries the cluster's `"error"` object verbatim.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Create an index whose documents carry the given text fields.
    ///
    /// # Arguments
    ///
    /// * `index` - Index name
    /// * `fields` - Property names mapped as `text`
    /// * `analyzer` - Analyzer applied to every text field, if any
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the cluster acknowledged the creation
    /// * `Err(SearchError)` - Otherwise
    async fn create_index(
        &self,
        index: &str,
        fields: &[String],
        analyzer: Option<&str>,
    ) -> Result<(), SearchError>;

    /// Delete an index and all of its documents.
    async fn drop_index(&self, index: &str) -> Result<(), SearchError>;

    /// Remove every document from an index, keeping its mapping.
    ///
    /// Succeeds only when the cluster reports no failures.
    async fn clear_index(&self, index: &str, refresh: bool) -> Result<(), SearchError>;

    /// Check whether an index exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The index exists
    /// * `Ok(false)` - The cluster answered that it does not
    /// * `Err(SearchError)` - The question could not be answered
    async fn is_index_exist(&self, index: &str) -> Result<bool, SearchError>;

    /// Submit a batch of index and delete actions in one request.
    ///
    /// An empty batch succeeds without contacting the cluster.
    async fn bulk(&self, batch: &BulkBatch, refresh: bool) -> Result<(), SearchError>;

    /// Run a search request body against an index.
    ///
    /// # Arguments
    ///
    /// * `index` - Index name
    /// * `body` - Full search request body
    /// * `timeout` - Server-side search timeout, if any
    async fn query(
        &self,
        index: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<QueryResult, SearchError>;
}
