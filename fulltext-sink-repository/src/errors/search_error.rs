//! Search error types.
//!
//! This module defines the error types that can occur while talking to the
//! search cluster.

use thiserror::Error;

/// Errors that can occur during search cluster operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The cluster could not be reached (connection refused, timeout, DNS).
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The cluster answered with an `"error"` object. The payload is the
    /// compact JSON of that object as sent by the cluster.
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// The response body could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A cluster member could not be turned into a usable URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No cluster member is configured.
    #[error("No search endpoint configured")]
    NoEndpoint,
}

impl SearchError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create an application error.
    pub fn application(msg: impl Into<String>) -> Self {
        Self::ApplicationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid endpoint error.
    pub fn invalid_endpoint(msg: impl Into<String>) -> Self {
        Self::InvalidEndpoint(msg.into())
    }

    /// Message as reported by the failing side, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::TransportError(msg)
            | Self::ApplicationError(msg)
            | Self::ParseError(msg)
            | Self::InvalidEndpoint(msg) => msg.clone(),
            Self::NoEndpoint => self.to_string(),
        }
    }

    /// Whether the same request may succeed if sent again.
    ///
    /// The listener retries transport and application errors alike on its
    /// next tick; callers that want to stop early can use this to tell
    /// configuration problems apart.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportError(_) | Self::ApplicationError(_) | Self::ParseError(_)
        )
    }
}
