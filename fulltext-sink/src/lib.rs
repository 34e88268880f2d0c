//! # Full-text Sink
//!
//! Process-level wiring for the full-text replication sink: configuration
//! from the environment, tracing setup, construction of the shared search
//! cluster handles, and one listener worker per partition running until
//! shutdown.

pub mod config;
pub mod sink;
pub mod telemetry;

pub use config::{Dependencies, LogFormat, SinkConfig};
pub use sink::Sink;
pub use telemetry::init_tracing;

use thiserror::Error;

/// Errors that can occur while starting or running the sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] fulltext_sink_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] fulltext_sink_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SinkError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
