//! Consumer module for the sink pipeline.
//!
//! Reads entries from the partition's replicated log and decodes their
//! payloads, and snapshot rows, into key/value mutations.

mod log_record;
mod mutation;
mod replicated_log;
mod snapshot;

pub use log_record::{BatchOp, LogRecord, LogType};
pub use mutation::{Mutation, MutationBatch};
pub use replicated_log::{LogEntry, ReplicatedLog};
pub use snapshot::{decode_kv, encode_kv};
