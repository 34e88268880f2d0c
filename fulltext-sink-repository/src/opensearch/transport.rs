//! HTTP transport backed by the `opensearch` crate.

use std::collections::HashMap;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    cert::CertificateValidation,
    http::{
        headers::{HeaderMap, HeaderValue, CONTENT_TYPE},
        transport::{SingleNodeConnectionPool, Transport, TransportBuilder},
        Method,
    },
};
use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::errors::SearchError;
use crate::interfaces::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::types::Endpoint;

/// Connection handles for every configured cluster member.
///
/// Built once at startup and shared by all protocol clients; dropping it
/// releases the underlying connection pools.
pub struct OpenSearchTransport {
    transports: HashMap<Endpoint, Transport>,
}

impl OpenSearchTransport {
    /// Build one transport per endpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchTransport)` - Ready to send requests
    /// * `Err(SearchError)` - If an endpoint URL is invalid or the HTTP
    ///   client could not be constructed
    pub fn new(endpoints: &[Endpoint], config: &TransportConfig) -> Result<Self, SearchError> {
        if endpoints.is_empty() {
            return Err(SearchError::NoEndpoint);
        }

        let mut transports = HashMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let transport = Self::build(endpoint, config)?;
            transports.insert(endpoint.clone(), transport);
        }

        info!(
            endpoints = endpoints.len(),
            timeout_ms = config.request_timeout.as_millis() as u64,
            verify_tls = config.verify_tls,
            "Created search cluster transport"
        );

        Ok(Self { transports })
    }

    fn build(endpoint: &Endpoint, config: &TransportConfig) -> Result<Transport, SearchError> {
        let url = endpoint.base_url()?;
        let conn_pool = SingleNodeConnectionPool::new(url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(config.request_timeout)
            .disable_proxy();
        if let Some(user) = &endpoint.user {
            let password = endpoint.password.clone().unwrap_or_default();
            builder = builder.auth(Credentials::Basic(user.clone(), password));
        }
        if !config.verify_tls {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        builder
            .build()
            .map_err(|e| SearchError::transport(e.to_string()))
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Put => Method::Put,
            HttpMethod::Post => Method::Post,
            HttpMethod::Delete => Method::Delete,
        }
    }
}

#[async_trait]
impl HttpTransport for OpenSearchTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: HttpRequest,
    ) -> Result<HttpResponse, SearchError> {
        let transport = self.transports.get(endpoint).ok_or_else(|| {
            SearchError::invalid_endpoint(format!(
                "{}://{} is not a configured member",
                endpoint.protocol, endpoint.address
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(request.content_type.as_str()),
        );
        let query = if request.query.is_empty() {
            None
        } else {
            Some(request.query.as_slice())
        };

        let response = transport
            .send(
                Self::method(request.method),
                &request.path,
                headers,
                query,
                request.body,
                request.timeout,
            )
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        let status = response.status_code().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        debug!(path = %request.path, status = status, "Search cluster responded");
        Ok(HttpResponse { status, body })
    }
}
