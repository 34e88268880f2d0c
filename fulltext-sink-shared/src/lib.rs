//! # Full-text Sink Shared
//!
//! Plain data types shared by the repository, pipeline and wiring crates:
//! replicated-log positions, the listener checkpoint, full-text index
//! descriptors and search results.

mod checkpoint;
mod index;
mod result;

pub use checkpoint::{Checkpoint, LogId, TermId};
pub use index::{IndexDescriptor, SchemaId};
pub use result::{Item, QueryResult};

/// Identifier of a partition within a graph space.
pub type PartitionId = u32;
