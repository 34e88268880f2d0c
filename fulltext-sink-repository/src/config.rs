//! Configuration types for the search cluster transport.

use std::time::Duration;

/// Configuration for the HTTP transport shared by every protocol client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total time allowed for one request, connection included.
    pub request_timeout: Duration,
    /// Whether server certificates are verified on `https` endpoints.
    pub verify_tls: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(3),
            verify_tls: false,
        }
    }
}

impl TransportConfig {
    /// Create a config with a custom request timeout.
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..Self::default()
        }
    }

    /// Enable or disable certificate verification.
    pub fn verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }
}
