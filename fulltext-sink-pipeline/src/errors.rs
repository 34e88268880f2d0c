//! Pipeline error types.

use thiserror::Error;

use fulltext_sink_repository::SearchError;

/// Errors that can occur in the sink pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A log payload, key or snapshot row is malformed.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Schema or index metadata could not be resolved.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// The search cluster rejected or did not receive a request.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// The checkpoint file could not be read or written.
    #[error("Checkpoint error: {0}")]
    CheckpointError(#[from] std::io::Error),

    /// A snapshot batch could not be applied.
    #[error("Snapshot error: {0}")]
    SnapshotError(String),
}

impl PipelineError {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a snapshot error.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::SnapshotError(msg.into())
    }
}
