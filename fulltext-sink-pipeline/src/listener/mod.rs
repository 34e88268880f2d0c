//! Listener module for the sink pipeline.
//!
//! A listener mirrors one partition's committed log into the search
//! cluster and records how far it got in a checkpoint file.

mod checkpoint_file;
#[allow(clippy::module_inception)]
mod listener;
mod state;

pub use checkpoint_file::CheckpointFile;
pub use listener::{Listener, SnapshotProgress, TickOutcome};
pub use state::ListenerState;

#[cfg(test)]
pub(crate) use listener::tests as test_support;
