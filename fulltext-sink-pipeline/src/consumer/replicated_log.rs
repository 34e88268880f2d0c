//! Access to a partition's replicated log.

use fulltext_sink_shared::{LogId, TermId};

/// One entry of the replicated log.
///
/// An empty payload is a heartbeat: it occupies a log id but carries no
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub log_id: LogId,
    pub term: TermId,
    pub payload: Vec<u8>,
}

impl LogEntry {
    pub fn new(log_id: LogId, term: TermId, payload: Vec<u8>) -> Self {
        Self {
            log_id,
            term,
            payload,
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Read side of the replication engine's write-ahead log.
pub trait ReplicatedLog: Send + Sync {
    /// Entries with ids in `from..=to`, in ascending order.
    ///
    /// The iterator may end early if part of the range is no longer
    /// available.
    fn entries(&self, from: LogId, to: LogId) -> Box<dyn Iterator<Item = LogEntry> + Send + '_>;
}
