//! Partition listener.
//!
//! Applies bounded windows of committed log entries to the search cluster
//! and checkpoints how far it got. The checkpoint only moves after the
//! cluster accepted a window, so a failed window is read again on the next
//! tick. Snapshot installation and log ticks share one lock and never
//! interleave.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ListenerConfig;
use crate::consumer::{decode_kv, LogRecord, MutationBatch, ReplicatedLog};
use crate::errors::PipelineError;
use crate::listener::checkpoint_file::CheckpointFile;
use crate::listener::state::ListenerState;
use crate::processor::DocumentExtractor;
use fulltext_sink_repository::{BulkBatch, SearchEngineClient};
use fulltext_sink_shared::{Checkpoint, LogId, PartitionId, TermId};

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing committed beyond the applied position.
    Idle,
    /// A window was accepted and checkpointed.
    Applied {
        /// Highest log id covered by the window.
        up_to: LogId,
        mutations: usize,
        documents: usize,
    },
}

/// Counters of one snapshot commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotProgress {
    /// Rows received, including rows that could not be decoded.
    pub rows: usize,
    /// Encoded size of the received rows.
    pub bytes: usize,
}

/// Position state guarded by the listener lock.
#[derive(Debug)]
struct Progress {
    /// Last durable checkpoint.
    checkpoint: Checkpoint,
    /// Newest commit reported by the replication layer.
    committed_log_id: LogId,
    committed_term: TermId,
}

/// Mirrors one partition's committed log into full-text indexes.
pub struct Listener {
    partition: PartitionId,
    log: Arc<dyn ReplicatedLog>,
    extractor: DocumentExtractor,
    client: Arc<dyn SearchEngineClient>,
    checkpoint_file: CheckpointFile,
    config: ListenerConfig,
    progress: Mutex<Progress>,
    state: watch::Sender<ListenerState>,
}

impl Listener {
    /// Create a listener resuming from the checkpoint stored in `checkpoint_file`.
    pub async fn open(
        partition: PartitionId,
        log: Arc<dyn ReplicatedLog>,
        extractor: DocumentExtractor,
        client: Arc<dyn SearchEngineClient>,
        checkpoint_file: CheckpointFile,
        config: ListenerConfig,
    ) -> Result<Self, PipelineError> {
        let checkpoint = checkpoint_file.load().await?;
        let (state, _) = watch::channel(ListenerState::Idle);

        info!(
            partition = partition,
            committed_log_id = checkpoint.committed_log_id,
            last_apply_log_id = checkpoint.last_apply_log_id,
            "Opened listener"
        );

        Ok(Self {
            partition,
            log,
            extractor,
            client,
            checkpoint_file,
            config,
            progress: Mutex::new(Progress {
                checkpoint,
                committed_log_id: checkpoint.committed_log_id,
                committed_term: checkpoint.committed_term,
            }),
            state,
        })
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: ListenerState) {
        self.state.send_replace(state);
    }

    /// Record that the replication layer committed up to `log_id`.
    ///
    /// Older positions are ignored. The new position becomes durable with
    /// the next accepted window.
    pub async fn on_committed(&self, log_id: LogId, term: TermId) {
        let mut progress = self.progress.lock().await;
        if log_id > progress.committed_log_id {
            progress.committed_log_id = log_id;
            progress.committed_term = term;
        }
    }

    /// Durable committed position and its term.
    pub async fn last_committed_log_id(&self) -> (LogId, TermId) {
        let progress = self.progress.lock().await;
        (
            progress.checkpoint.committed_log_id,
            progress.checkpoint.committed_term,
        )
    }

    /// Durable applied position.
    pub async fn last_apply_log_id(&self) -> LogId {
        self.progress.lock().await.checkpoint.last_apply_log_id
    }

    /// Submit the documents of `batch` in one bulk request.
    ///
    /// Returns the number of documents sent. Nothing is sent when the batch
    /// touches no full-text index.
    pub async fn apply(&self, batch: &MutationBatch) -> Result<usize, PipelineError> {
        let mut bulk = BulkBatch::new();
        let documents = self.extractor.extract_into(batch, &mut bulk);
        if bulk.is_empty() {
            return Ok(0);
        }

        self.client
            .bulk(&bulk, self.config.refresh_on_bulk)
            .await
            .inspect_err(|e| {
                error!(
                    partition = self.partition,
                    error = %e,
                    documents = documents,
                    "Bulk submission failed"
                )
            })?;
        Ok(documents)
    }

    /// Durably record `(log_id, term, apply_id)` as the checkpoint.
    pub async fn persist(
        &self,
        log_id: LogId,
        term: TermId,
        apply_id: LogId,
    ) -> Result<(), PipelineError> {
        let mut progress = self.progress.lock().await;
        let result = self.persist_locked(&mut progress, log_id, term, apply_id).await;
        self.set_state(ListenerState::Idle);
        result
    }

    async fn persist_locked(
        &self,
        progress: &mut Progress,
        log_id: LogId,
        term: TermId,
        apply_id: LogId,
    ) -> Result<(), PipelineError> {
        self.set_state(ListenerState::Persisting);
        let checkpoint = Checkpoint::new(log_id, term, apply_id);

        self.checkpoint_file
            .store(&checkpoint)
            .await
            .inspect_err(|e| {
                error!(
                    partition = self.partition,
                    error = %e,
                    path = %self.checkpoint_file.path().display(),
                    "Failed to persist checkpoint"
                )
            })?;

        progress.checkpoint = checkpoint;
        if log_id > progress.committed_log_id {
            progress.committed_log_id = log_id;
            progress.committed_term = term;
        }
        Ok(())
    }

    /// Apply the next window of committed entries.
    ///
    /// Reads entries after the applied position up to the known committed
    /// position, stopping once `commit_batch_size` mutations are collected.
    /// On success the checkpoint moves to the last entry read; on failure it
    /// is left untouched.
    #[instrument(skip(self), fields(partition = self.partition))]
    pub async fn process_logs(&self) -> Result<TickOutcome, PipelineError> {
        let mut progress = self.progress.lock().await;
        let result = self.process_window(&mut progress).await;
        self.set_state(ListenerState::Idle);
        result
    }

    async fn process_window(&self, progress: &mut Progress) -> Result<TickOutcome, PipelineError> {
        let last_apply = progress.checkpoint.last_apply_log_id;
        let committed = progress.committed_log_id;
        let term = progress.committed_term;
        if last_apply >= committed {
            return Ok(TickOutcome::Idle);
        }

        self.set_state(ListenerState::Applying);
        let mut batch = MutationBatch::new();
        let mut up_to = last_apply;

        for entry in self.log.entries(last_apply + 1, committed) {
            up_to = entry.log_id;
            if entry.is_heartbeat() {
                continue;
            }

            match LogRecord::decode(&entry.payload) {
                Ok(LogRecord::Unknown(log_type)) => {
                    warn!(log_id = entry.log_id, log_type = log_type, "Skipping unknown log type");
                }
                Ok(record) => batch.extend_from_record(record),
                Err(e) => {
                    warn!(log_id = entry.log_id, error = %e, "Skipping undecodable log entry");
                }
            }

            if batch.len() >= self.config.commit_batch_size {
                break;
            }
        }

        if up_to == last_apply {
            warn!(
                from = last_apply + 1,
                to = committed,
                "Committed log range is not readable"
            );
            return Ok(TickOutcome::Idle);
        }

        let documents = self.apply(&batch).await?;
        self.persist_locked(progress, committed, term, up_to).await?;

        debug!(
            up_to = up_to,
            mutations = batch.len(),
            documents = documents,
            "Applied log window"
        );
        Ok(TickOutcome::Applied {
            up_to,
            mutations: batch.len(),
            documents,
        })
    }

    /// Apply one chunk of a snapshot.
    ///
    /// Every row is treated as a put. When `finished` is set the checkpoint
    /// jumps to `(log_id, term, log_id)`; otherwise it is left as is.
    #[instrument(skip(self, rows), fields(partition = self.partition, rows = rows.len()))]
    pub async fn commit_snapshot(
        &self,
        rows: &[Vec<u8>],
        log_id: LogId,
        term: TermId,
        finished: bool,
    ) -> Result<SnapshotProgress, PipelineError> {
        let mut progress = self.progress.lock().await;
        self.set_state(ListenerState::InstallingSnapshot);
        let result = self
            .install_snapshot(&mut progress, rows, log_id, term, finished)
            .await;
        self.set_state(ListenerState::Idle);
        result
    }

    async fn install_snapshot(
        &self,
        progress: &mut Progress,
        rows: &[Vec<u8>],
        log_id: LogId,
        term: TermId,
        finished: bool,
    ) -> Result<SnapshotProgress, PipelineError> {
        let mut batch = MutationBatch::new();
        let mut counters = SnapshotProgress::default();
        for row in rows {
            counters.rows += 1;
            counters.bytes += row.len();
            match decode_kv(row) {
                Ok((key, value)) => batch.put(key, value),
                Err(e) => warn!(error = %e, "Skipping undecodable snapshot row"),
            }
        }

        if let Err(e) = self.apply(&batch).await {
            return Err(PipelineError::snapshot(format!(
                "failed to apply {} snapshot rows: {}",
                counters.rows, e
            )));
        }

        if finished {
            self.persist_locked(progress, log_id, term, log_id).await?;
            info!(log_id = log_id, term = term, "Snapshot installed");
        }
        Ok(counters)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::consumer::{encode_kv, LogEntry};
    use crate::processor::{MockSchema, SchemaKind, TagKey, TextRowDecoder, VidLayout};
    use async_trait::async_trait;
    use fulltext_sink_repository::SearchError;
    use fulltext_sink_shared::QueryResult;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// In-memory log recording every requested range.
    #[derive(Default)]
    pub(crate) struct MemoryLog {
        pub entries: Vec<LogEntry>,
        pub reads: std::sync::Mutex<Vec<(LogId, LogId)>>,
    }

    impl MemoryLog {
        pub fn new(entries: Vec<LogEntry>) -> Arc<Self> {
            Arc::new(Self {
                entries,
                reads: std::sync::Mutex::new(Vec::new()),
            })
        }

        pub fn reads(&self) -> Vec<(LogId, LogId)> {
            self.reads.lock().unwrap().clone()
        }
    }

    impl ReplicatedLog for MemoryLog {
        fn entries(
            &self,
            from: LogId,
            to: LogId,
        ) -> Box<dyn Iterator<Item = LogEntry> + Send + '_> {
            self.reads.lock().unwrap().push((from, to));
            Box::new(
                self.entries
                    .iter()
                    .filter(move |e| e.log_id >= from && e.log_id <= to)
                    .cloned(),
            )
        }
    }

    /// Search client recording bulk batches.
    #[derive(Default)]
    pub(crate) struct MockSearchClient {
        pub batches: Mutex<Vec<BulkBatch>>,
        pub failures: Mutex<VecDeque<SearchError>>,
        pub delay: Option<Duration>,
        pub gate: Option<Arc<Notify>>,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl MockSearchClient {
        pub async fn fail_next(&self, error: SearchError) {
            self.failures.lock().await.push_back(error);
        }

        pub async fn bulk_count(&self) -> usize {
            self.batches.lock().await.len()
        }
    }

    #[async_trait]
    impl SearchEngineClient for MockSearchClient {
        async fn create_index(
            &self,
            _index: &str,
            _fields: &[String],
            _analyzer: Option<&str>,
        ) -> Result<(), SearchError> {
            Ok(())
        }

        async fn drop_index(&self, _index: &str) -> Result<(), SearchError> {
            Ok(())
        }

        async fn clear_index(&self, _index: &str, _refresh: bool) -> Result<(), SearchError> {
            Ok(())
        }

        async fn is_index_exist(&self, _index: &str) -> Result<bool, SearchError> {
            Ok(true)
        }

        async fn bulk(&self, batch: &BulkBatch, _refresh: bool) -> Result<(), SearchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(error) = self.failures.lock().await.pop_front() {
                return Err(error);
            }
            self.batches.lock().await.push(batch.clone());
            Ok(())
        }

        async fn query(
            &self,
            _index: &str,
            _body: &Value,
            _timeout: Option<Duration>,
        ) -> Result<QueryResult, SearchError> {
            Ok(QueryResult::empty())
        }
    }

    pub(crate) fn vertex_put(vid: i64, text: &str) -> Vec<u8> {
        LogRecord::Put {
            key: TagKey::encode(1, &vid.to_le_bytes(), 8, 1),
            value: format!("text={}", text).into_bytes(),
        }
        .encode(0)
    }

    fn vertex_remove(vid: i64) -> Vec<u8> {
        LogRecord::Remove {
            key: TagKey::encode(1, &vid.to_le_bytes(), 8, 1),
        }
        .encode(0)
    }

    pub(crate) async fn open_listener(
        dir: &TempDir,
        log: Arc<MemoryLog>,
        client: Arc<MockSearchClient>,
        config: ListenerConfig,
    ) -> Listener {
        let schema = MockSchema::default().with_index(SchemaKind::Tag, 1, "idx", &["text"]);
        let extractor =
            DocumentExtractor::new(Arc::new(schema), Arc::new(TextRowDecoder), VidLayout::int64());
        Listener::open(
            1,
            log,
            extractor,
            client,
            CheckpointFile::new(dir.path().join("part_1.ckpt")),
            config,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_process_logs_advances_checkpoint() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![
            LogEntry::new(1, 1, vertex_put(100, "hello")),
            LogEntry::new(2, 1, Vec::new()),
            LogEntry::new(3, 1, vertex_remove(7)),
        ]);
        let client = Arc::new(MockSearchClient::default());
        let listener = open_listener(&dir, log, client.clone(), ListenerConfig::default()).await;

        listener.on_committed(3, 1).await;
        let outcome = listener.process_logs().await.unwrap();

        assert_eq!(
            outcome,
            TickOutcome::Applied {
                up_to: 3,
                mutations: 2,
                documents: 2
            }
        );
        assert_eq!(listener.last_apply_log_id().await, 3);
        assert_eq!(listener.last_committed_log_id().await, (3, 1));
        assert_eq!(client.batches.lock().await[0].len(), 2);

        let stored = CheckpointFile::new(dir.path().join("part_1.ckpt"))
            .load()
            .await
            .unwrap();
        assert_eq!(stored, Checkpoint::new(3, 1, 3));
        assert_eq!(listener.process_logs().await.unwrap(), TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_failed_bulk_keeps_checkpoint_and_rereads() {
        let dir = TempDir::new().unwrap();
        let checkpoint_path = dir.path().join("part_1.ckpt");
        CheckpointFile::new(&checkpoint_path)
            .store(&Checkpoint::new(1, 1, 1))
            .await
            .unwrap();
        let before = std::fs::read(&checkpoint_path).unwrap();

        let log = MemoryLog::new(vec![
            LogEntry::new(2, 1, vertex_put(100, "a")),
            LogEntry::new(3, 1, vertex_put(101, "b")),
        ]);
        let client = Arc::new(MockSearchClient::default());
        client
            .fail_next(SearchError::transport("connection refused"))
            .await;
        let listener =
            open_listener(&dir, log.clone(), client.clone(), ListenerConfig::default()).await;
        listener.on_committed(3, 1).await;

        let err = listener.process_logs().await.unwrap_err();
        assert!(matches!(err, PipelineError::SearchError(SearchError::TransportError(_))));
        assert_eq!(listener.last_apply_log_id().await, 1);
        assert_eq!(std::fs::read(&checkpoint_path).unwrap(), before);

        listener.process_logs().await.unwrap();
        assert_eq!(log.reads(), vec![(2, 3), (2, 3)]);
        assert_eq!(listener.last_apply_log_id().await, 3);
    }

    #[tokio::test]
    async fn test_window_bounded_by_batch_size() {
        let dir = TempDir::new().unwrap();
        let entries = (1..=5)
            .map(|id| LogEntry::new(id, 2, vertex_put(id as i64, "x")))
            .collect();
        let log = MemoryLog::new(entries);
        let client = Arc::new(MockSearchClient::default());
        let config = ListenerConfig::with_commit_batch_size(2);
        let listener = open_listener(&dir, log, client.clone(), config).await;
        listener.on_committed(5, 2).await;

        assert!(matches!(
            listener.process_logs().await.unwrap(),
            TickOutcome::Applied { up_to: 2, .. }
        ));
        assert_eq!(listener.last_apply_log_id().await, 2);
        assert_eq!(listener.last_committed_log_id().await, (5, 2));

        listener.process_logs().await.unwrap();
        listener.process_logs().await.unwrap();
        assert_eq!(listener.last_apply_log_id().await, 5);
        assert_eq!(client.bulk_count().await, 3);
    }

    #[tokio::test]
    async fn test_heartbeat_window_advances_without_bulk() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![
            LogEntry::new(1, 1, Vec::new()),
            LogEntry::new(2, 1, Vec::new()),
        ]);
        let client = Arc::new(MockSearchClient::default());
        let listener = open_listener(&dir, log, client.clone(), ListenerConfig::default()).await;
        listener.on_committed(2, 1).await;

        listener.process_logs().await.unwrap();
        assert_eq!(listener.last_apply_log_id().await, 2);
        assert_eq!(client.bulk_count().await, 0);
    }

    #[tokio::test]
    async fn test_undecodable_entry_skipped() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![
            LogEntry::new(1, 1, vec![1, 2, 3]),
            LogEntry::new(2, 1, vertex_put(5, "ok")),
        ]);
        let client = Arc::new(MockSearchClient::default());
        let listener = open_listener(&dir, log, client.clone(), ListenerConfig::default()).await;
        listener.on_committed(2, 1).await;

        let outcome = listener.process_logs().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Applied { up_to: 2, mutations: 1, .. }));
    }

    #[tokio::test]
    async fn test_commit_snapshot() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockSearchClient::default());
        let listener =
            open_listener(&dir, MemoryLog::new(Vec::new()), client.clone(), ListenerConfig::default())
                .await;

        let rows = vec![
            encode_kv(&TagKey::encode(1, &1i64.to_le_bytes(), 8, 1), b"text=a"),
            encode_kv(&TagKey::encode(1, &2i64.to_le_bytes(), 8, 1), b"text=b"),
        ];
        let expected_bytes: usize = rows.iter().map(Vec::len).sum();

        let progress = listener.commit_snapshot(&rows, 10, 2, false).await.unwrap();
        assert_eq!(progress, SnapshotProgress { rows: 2, bytes: expected_bytes });
        assert_eq!(listener.last_apply_log_id().await, 0);

        listener.commit_snapshot(&[], 10, 2, true).await.unwrap();
        assert_eq!(listener.last_apply_log_id().await, 10);
        assert_eq!(listener.last_committed_log_id().await, (10, 2));
        assert_eq!(client.bulk_count().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_checkpoint() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockSearchClient::default());
        client.fail_next(SearchError::application(r#"{"reason":"mock error"}"#)).await;
        let listener =
            open_listener(&dir, MemoryLog::new(Vec::new()), client, ListenerConfig::default()).await;

        let rows = vec![encode_kv(&TagKey::encode(1, &1i64.to_le_bytes(), 8, 1), b"text=a")];
        let err = listener.commit_snapshot(&rows, 10, 2, true).await.unwrap_err();

        assert!(matches!(err, PipelineError::SnapshotError(_)));
        assert_eq!(listener.last_apply_log_id().await, 0);
        assert!(!dir.path().join("part_1.ckpt").exists());
    }

    #[tokio::test]
    async fn test_snapshot_and_ticks_never_overlap() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![LogEntry::new(1, 1, vertex_put(1, "a"))]);
        let client = Arc::new(MockSearchClient {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let listener = open_listener(&dir, log, client.clone(), ListenerConfig::default()).await;
        listener.on_committed(1, 1).await;

        let rows = vec![encode_kv(&TagKey::encode(1, &2i64.to_le_bytes(), 8, 1), b"text=b")];
        let (tick, snapshot) = tokio::join!(
            listener.process_logs(),
            listener.commit_snapshot(&rows, 5, 1, false)
        );
        tick.unwrap();
        snapshot.unwrap();

        assert_eq!(client.bulk_count().await, 2);
        assert_eq!(client.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_state_while_applying() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![LogEntry::new(1, 1, vertex_put(1, "a"))]);
        let gate = Arc::new(Notify::new());
        let client = Arc::new(MockSearchClient {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let listener =
            Arc::new(open_listener(&dir, log, client, ListenerConfig::default()).await);
        listener.on_committed(1, 1).await;
        let mut states = listener.subscribe_state();

        let task = {
            let listener = listener.clone();
            tokio::spawn(async move { listener.process_logs().await })
        };

        states
            .wait_for(|state| *state == ListenerState::Applying)
            .await
            .unwrap();
        gate.notify_one();
        task.await.unwrap().unwrap();

        assert_eq!(listener.state(), ListenerState::Idle);
    }
}
