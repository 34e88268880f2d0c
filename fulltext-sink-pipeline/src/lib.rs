//! # Full-text Sink Pipeline
//!
//! This crate turns a partition's replicated log into search documents and
//! keeps the search cluster in step with it.
//!
//! ## Architecture
//!
//! 1. **Consumer**: Decodes log payloads and snapshot rows into mutations
//! 2. **Processor**: Maps mutations onto documents of the affected indexes
//! 3. **Listener**: Applies bounded windows of the log and checkpoints progress
//! 4. **Orchestrator**: Drives the listener on a timer until shutdown

pub mod config;
pub mod consumer;
pub mod errors;
pub mod listener;
pub mod orchestrator;
pub mod processor;

pub use config::ListenerConfig;
pub use errors::PipelineError;
pub use listener::{Listener, ListenerState, SnapshotProgress, TickOutcome};
pub use orchestrator::ListenerWorker;
