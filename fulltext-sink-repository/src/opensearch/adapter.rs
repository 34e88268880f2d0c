//! Index adapter over the protocol client.
//!
//! Turns index-level operations into protocol calls against a member picked
//! by the configured [`EndpointSelector`], and interprets the cluster's
//! answers into plain success, failure or parsed search hits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::SearchError;
use crate::interfaces::{EndpointSelector, HttpTransport, RandomSelector, SearchEngineClient};
use crate::opensearch::bulk::BulkBatch;
use crate::opensearch::client::EsClient;
use crate::opensearch::index_config::index_mapping;
use crate::opensearch::queries::{self, SearchOptions};
use crate::types::Endpoint;
use fulltext_sink_shared::{Item, QueryResult};

/// Full-text index adapter for an OpenSearch or Elasticsearch cluster.
///
/// # Example
///
/// ```ignore
/// let endpoints = vec![Endpoint::parse("http://127.0.0.1:9200")?];
/// let transport = Arc::new(OpenSearchTransport::new(&endpoints, &TransportConfig::default())?);
/// let adapter = EsAdapter::new(transport, endpoints);
///
/// adapter.create_index("people", &["name".to_string()], None).await?;
/// let hits = adapter.prefix("people", "name", "ali", SearchOptions::default()).await?;
/// ```
pub struct EsAdapter {
    transport: Arc<dyn HttpTransport>,
    endpoints: Vec<Endpoint>,
    selector: Arc<dyn EndpointSelector>,
}

impl EsAdapter {
    /// Create an adapter choosing members uniformly at random.
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: Vec<Endpoint>) -> Self {
        Self::with_selector(transport, endpoints, Arc::new(RandomSelector))
    }

    pub fn with_selector(
        transport: Arc<dyn HttpTransport>,
        endpoints: Vec<Endpoint>,
        selector: Arc<dyn EndpointSelector>,
    ) -> Self {
        Self {
            transport,
            endpoints,
            selector,
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    fn client(&self) -> Result<EsClient, SearchError> {
        let endpoint = self
            .selector
            .select(&self.endpoints)
            .ok_or(SearchError::NoEndpoint)?;
        Ok(EsClient::new(self.transport.clone(), endpoint.clone()))
    }

    /// Query-string search over `fields` (every field when empty).
    pub async fn query_string(
        &self,
        index: &str,
        query: &str,
        fields: &[String],
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        self.search(index, queries::build_query_string(query, fields), options)
            .await
    }

    /// Every document of the index.
    pub async fn match_all(
        &self,
        index: &str,
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        self.search(index, queries::build_match_all(), options).await
    }

    pub async fn prefix(
        &self,
        index: &str,
        field: &str,
        prefix: &str,
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        self.search(index, queries::build_prefix(field, prefix), options)
            .await
    }

    pub async fn wildcard(
        &self,
        index: &str,
        field: &str,
        pattern: &str,
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        self.search(index, queries::build_wildcard(field, pattern), options)
            .await
    }

    pub async fn regexp(
        &self,
        index: &str,
        field: &str,
        pattern: &str,
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        self.search(index, queries::build_regexp(field, pattern), options)
            .await
    }

    pub async fn fuzzy(
        &self,
        index: &str,
        field: &str,
        value: &str,
        fuzziness: &str,
        operator: &str,
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        let body = queries::build_fuzzy(field, value, fuzziness, operator);
        self.search(index, body, options).await
    }

    async fn search(
        &self,
        index: &str,
        body: Value,
        options: SearchOptions,
    ) -> Result<QueryResult, SearchError> {
        let body = options.apply(body);
        self.query(index, &body, options.timeout).await
    }

    /// Parse the hits of a search response.
    ///
    /// A response without hits, or with `hits.total.value == 0`, is an
    /// empty result. Hits carrying neither a `vid` nor `src`/`dst` are
    /// skipped. An empty `vid` counts as absent, since every document
    /// stores all identity fields.
    fn parse_hits(response: &Value) -> Result<QueryResult, SearchError> {
        let hits = match response.get("hits") {
            Some(hits) => hits,
            None => return Err(SearchError::parse(format!("missing hits: {}", response))),
        };
        let hits = match hits.get("hits").and_then(Value::as_array) {
            Some(hits) => hits,
            None => return Ok(QueryResult::empty()),
        };

        let items = hits
            .iter()
            .filter_map(|hit| {
                let item = Self::parse_hit(hit);
                if item.is_none() {
                    warn!(hit = %hit, "Skipping search hit without identity fields");
                }
                item
            })
            .collect();
        Ok(QueryResult { items })
    }

    fn parse_hit(hit: &Value) -> Option<Item> {
        let source = hit.get("_source")?;
        let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);

        if let Some(vid) = source
            .get("vid")
            .and_then(as_text)
            .filter(|vid| !vid.is_empty())
        {
            return Some(Item::vertex(vid, score));
        }

        let src = source.get("src").and_then(as_text)?;
        let dst = source.get("dst").and_then(as_text)?;
        let rank = match source.get("rank") {
            Some(Value::Number(n)) => n.as_i64()?,
            Some(Value::String(s)) => s.parse().ok()?,
            _ => 0,
        };
        Some(Item::edge(src, dst, rank, score))
    }

    /// Log per-document failures of an accepted bulk request.
    fn report_item_failures(response: &Value) {
        if response.get("errors").and_then(Value::as_bool) != Some(true) {
            return;
        }
        let failures: Vec<&Value> = response
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object()?.values().next())
                    .filter_map(|result| result.get("error"))
                    .collect()
            })
            .unwrap_or_default();

        warn!(
            failed = failures.len(),
            first_error = %failures.first().map(|e| e.to_string()).unwrap_or_default(),
            "Bulk request accepted with per-document failures"
        );
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn require_acknowledged(action: &str, index: &str, response: &Value) -> Result<(), SearchError> {
    if response.get("acknowledged").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err(SearchError::application(format!(
            "{} {} not acknowledged: {}",
            action, index, response
        )))
    }
}

#[async_trait]
impl SearchEngineClient for EsAdapter {
    #[instrument(skip(self, fields))]
    async fn create_index(
        &self,
        index: &str,
        fields: &[String],
        analyzer: Option<&str>,
    ) -> Result<(), SearchError> {
        let body = index_mapping(fields, analyzer);
        let response = self.client()?.create_index(index, &body).await?;
        require_acknowledged("create index", index, &response)?;
        info!(index = %index, fields = fields.len(), "Created full-text index");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn drop_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self.client()?.drop_index(index).await?;
        require_acknowledged("drop index", index, &response)?;
        info!(index = %index, "Dropped full-text index");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_index(&self, index: &str, refresh: bool) -> Result<(), SearchError> {
        let response = self
            .client()?
            .delete_by_query(index, &queries::build_clear_all(), refresh)
            .await?;

        match response.get("failures").and_then(Value::as_array) {
            Some(failures) if failures.is_empty() => {
                debug!(index = %index, deleted = %response["deleted"], "Cleared index");
                Ok(())
            }
            _ => {
                error!(index = %index, response = %response, "Clear index reported failures");
                Err(SearchError::application(format!(
                    "clear index {} failed: {}",
                    index, response
                )))
            }
        }
    }

    /// Any successful lookup means the name resolves, whether it names the
    /// index itself or an alias of it.
    async fn is_index_exist(&self, index: &str) -> Result<bool, SearchError> {
        let exists = self.client()?.get_index(index).await?.is_some();
        Ok(exists)
    }

    async fn bulk(&self, batch: &BulkBatch, refresh: bool) -> Result<(), SearchError> {
        if batch.is_empty() {
            return Ok(());
        }

        let response = self.client()?.bulk(batch.to_ndjson(), refresh).await?;
        Self::report_item_failures(&response);
        debug!(actions = batch.len(), "Bulk request accepted");
        Ok(())
    }

    async fn query(
        &self,
        index: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<QueryResult, SearchError> {
        let response = self.client()?.search(index, body, timeout).await?;
        Self::parse_hits(&response)
    }
}
