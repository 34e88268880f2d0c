//! Listener checkpoint.

use serde::{Deserialize, Serialize};

/// Position of an entry in the replicated log.
pub type LogId = u64;

/// Raft term of a log entry.
pub type TermId = u64;

/// How far a listener has applied its partition's log.
///
/// `last_apply_log_id` never exceeds `committed_log_id`; both only move
/// forward once a batch has been accepted by the search cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last log id known to be committed by the replication layer.
    pub committed_log_id: LogId,
    /// Term of `committed_log_id`.
    pub committed_term: TermId,
    /// Highest log id whose mutations reached the search cluster.
    pub last_apply_log_id: LogId,
}

impl Checkpoint {
    /// Width in bytes of the on-disk encoding.
    pub const ENCODED_LEN: usize = 24;

    /// Create a checkpoint, clamping the applied id to the committed id.
    pub fn new(committed_log_id: LogId, committed_term: TermId, last_apply_log_id: LogId) -> Self {
        Self {
            committed_log_id,
            committed_term,
            last_apply_log_id: last_apply_log_id.min(committed_log_id),
        }
    }

    /// Whether committed entries remain to be applied.
    pub fn has_pending(&self) -> bool {
        self.last_apply_log_id < self.committed_log_id
    }

    /// Encode as three consecutive little-endian u64 fields.
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut raw = [0u8; Self::ENCODED_LEN];
        raw[0..8].copy_from_slice(&self.committed_log_id.to_le_bytes());
        raw[8..16].copy_from_slice(&self.committed_term.to_le_bytes());
        raw[16..24].copy_from_slice(&self.last_apply_log_id.to_le_bytes());
        raw
    }

    /// Decode the layout written by [`Checkpoint::encode`].
    ///
    /// Returns `None` when `raw` is shorter than [`Checkpoint::ENCODED_LEN`].
    pub fn decode(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::ENCODED_LEN {
            return None;
        }
        let field = |at: usize| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&raw[at..at + 8]);
            u64::from_le_bytes(buf)
        };
        Some(Self {
            committed_log_id: field(0),
            committed_term: field(8),
            last_apply_log_id: field(16),
        })
    }
}
