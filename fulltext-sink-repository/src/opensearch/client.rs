//! Protocol client for one search cluster member.
//!
//! Each remote action is one method. Every response goes through the same
//! normalisation: no response is a transport error, an `"error"` object in
//! the body is an application error carrying that object verbatim, and
//! anything else is returned as parsed JSON.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::SearchError;
use crate::interfaces::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::Endpoint;

/// Extra time a search request waits past its server-side timeout.
const SEARCH_RESPONSE_GRACE: Duration = Duration::from_secs(1);

/// Protocol client bound to a single cluster member.
#[derive(Clone)]
pub struct EsClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: Endpoint,
}

impl EsClient {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `PUT /{index}` with the given settings and mappings.
    pub async fn create_index(&self, index: &str, body: &Value) -> Result<Value, SearchError> {
        let request = HttpRequest::put(format!("/{}", index)).with_json(body.to_string());
        self.execute(request).await
    }

    /// `DELETE /{index}`.
    pub async fn drop_index(&self, index: &str) -> Result<Value, SearchError> {
        self.execute(HttpRequest::delete(format!("/{}", index))).await
    }

    /// `GET /{index}`.
    ///
    /// Returns `Ok(None)` when the cluster answers 404.
    pub async fn get_index(&self, index: &str) -> Result<Option<Value>, SearchError> {
        let response = self.send(HttpRequest::get(format!("/{}", index))).await?;
        if response.status == 404 {
            debug!(index = %index, "Index not found");
            return Ok(None);
        }
        interpret(response).map(Some)
    }

    /// `POST /{index}/_delete_by_query`.
    pub async fn delete_by_query(
        &self,
        index: &str,
        body: &Value,
        refresh: bool,
    ) -> Result<Value, SearchError> {
        let request = HttpRequest::post(format!("/{}/_delete_by_query", index))
            .with_query("refresh", refresh.to_string())
            .with_json(body.to_string());
        self.execute(request).await
    }

    /// `POST /{index}/_search`, with an optional server-side timeout.
    ///
    /// With a timeout set, the request itself waits that long plus
    /// `SEARCH_RESPONSE_GRACE` instead of the transport default.
    pub async fn search(
        &self,
        index: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value, SearchError> {
        let mut request =
            HttpRequest::post(format!("/{}/_search", index)).with_json(body.to_string());
        if let Some(timeout) = timeout {
            request = request
                .with_query("timeout", format!("{}ms", timeout.as_millis()))
                .with_timeout(timeout + SEARCH_RESPONSE_GRACE);
        }
        self.execute(request).await
    }

    /// `POST /_bulk` with an NDJSON body.
    pub async fn bulk(&self, body: String, refresh: bool) -> Result<Value, SearchError> {
        let request = HttpRequest::post("/_bulk")
            .with_query("refresh", refresh.to_string())
            .with_ndjson(body);
        self.execute(request).await
    }

    async fn execute(&self, request: HttpRequest) -> Result<Value, SearchError> {
        let response = self.send(request).await?;
        interpret(response)
    }

    #[instrument(skip(self, request), fields(address = %self.endpoint.address, path = %request.path))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SearchError> {
        self.transport
            .send(&self.endpoint, request)
            .await
            .inspect_err(|e| warn!(error = %e, "Search cluster request failed"))
    }
}

/// Turn a raw response into JSON or a normalised error.
fn interpret(response: HttpResponse) -> Result<Value, SearchError> {
    if response.body.trim().is_empty() {
        return if response.is_success() {
            Ok(Value::Null)
        } else {
            Err(SearchError::application(format!(
                "HTTP {} with empty body",
                response.status
            )))
        };
    }

    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) if response.is_success() => {
            return Err(SearchError::parse(format!("{}: {}", e, response.body)));
        }
        Err(_) => {
            return Err(SearchError::application(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }
    };

    if let Some(error) = value.get("error").filter(|e| is_present(e)) {
        return Err(SearchError::application(error_message(error)));
    }
    if !response.is_success() {
        return Err(SearchError::application(format!(
            "HTTP {}: {}",
            response.status, value
        )));
    }
    Ok(value)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Number(_) => true,
    }
}

/// Compact JSON of the error object; bare strings are passed through unquoted.
fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
