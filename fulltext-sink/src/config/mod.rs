//! Configuration and dependency wiring for the full-text sink.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{LogFormat, SinkConfig};
