//! HTTP transport trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::Endpoint;

/// HTTP verbs used against the search cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

/// Body encoding of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    NdJson,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::NdJson => "application/x-ndjson",
        }
    }
}

/// A request relative to an endpoint's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute path, e.g. `/my_index/_search`.
    pub path: String,
    /// Query string pairs, in order.
    pub query: Vec<(String, String)>,
    pub content_type: ContentType,
    pub body: Option<String>,
    /// Overrides the transport's request timeout when set.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            content_type: ContentType::Json,
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: impl Into<String>) -> Self {
        self.content_type = ContentType::Json;
        self.body = Some(body.into());
        self
    }

    /// Attach a newline-delimited JSON body.
    pub fn with_ndjson(mut self, body: impl Into<String>) -> Self {
        self.content_type = ContentType::NdJson;
        self.body = Some(body.into());
        self
    }

    /// Append one query string parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to one cluster member.
///
/// Implementations return `Err(SearchError::TransportError)` only when no
/// response was received. Any HTTP status, including 4xx and 5xx, is an
/// `Ok` response for the caller to interpret.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: HttpRequest,
    ) -> Result<HttpResponse, SearchError>;
}
