//! Runs one listener worker per partition until shutdown.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::SinkError;
use fulltext_sink_pipeline::{Listener, ListenerWorker};

/// Set of running listener workers sharing one shutdown signal.
pub struct Sink {
    shutdown_tx: broadcast::Sender<()>,
    workers: Vec<JoinHandle<()>>,
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            workers: Vec::new(),
        }
    }

    /// Start a worker for `listener`, ticking at its configured interval.
    pub fn spawn(&mut self, listener: Arc<Listener>) {
        info!(partition = listener.partition(), "Spawning listener worker");
        let worker = ListenerWorker::new(listener, self.shutdown_tx.subscribe());
        self.workers.push(tokio::spawn(worker.run()));
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Ask every worker to stop after its current tick.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Listener worker panicked");
            }
        }
    }

    /// Run until Ctrl-C, then stop every worker.
    pub async fn run_until_ctrl_c(self) -> Result<(), SinkError> {
        info!(workers = self.workers.len(), "Full-text sink running");
        tokio::signal::ctrl_c().await?;

        info!("Received shutdown signal");
        self.shutdown();
        self.join().await;
        info!("Full-text sink shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dependencies, SinkConfig};
    use fulltext_sink_pipeline::consumer::{LogEntry, ReplicatedLog};
    use fulltext_sink_pipeline::processor::{
        Row, RowDecoder, SchemaKind, SchemaLookup, VidLayout,
    };
    use fulltext_sink_pipeline::PipelineError;
    use fulltext_sink_shared::{IndexDescriptor, LogId, SchemaId};
    use std::collections::HashMap;
    use std::time::Duration;

    struct EmptyLog;

    impl ReplicatedLog for EmptyLog {
        fn entries(&self, _from: LogId, _to: LogId) -> Box<dyn Iterator<Item = LogEntry> + Send + '_> {
            Box::new(std::iter::empty())
        }
    }

    struct NoIndexes;

    impl SchemaLookup for NoIndexes {
        fn fulltext_indexes(
            &self,
            _kind: SchemaKind,
            _schema_id: SchemaId,
        ) -> Result<Vec<IndexDescriptor>, PipelineError> {
            Ok(Vec::new())
        }
    }

    impl RowDecoder for NoIndexes {
        fn decode(&self, _kind: SchemaKind, _schema_id: SchemaId, _raw: &[u8]) -> Result<Row, PipelineError> {
            Ok(Row::new())
        }
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let data_dir = temp_dir.path().to_string_lossy().into_owned();
        let vars = HashMap::from([
            ("FULLTEXT_DATA_DIR".to_string(), data_dir),
            ("LISTENER_TICK_MS".to_string(), "5".to_string()),
        ]);
        let config = SinkConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let deps = Dependencies::new(config).unwrap();

        let mut sink = Sink::new();
        for partition in 1..=2 {
            let listener = deps
                .open_listener(
                    partition,
                    Arc::new(EmptyLog),
                    Arc::new(NoIndexes),
                    Arc::new(NoIndexes),
                    VidLayout::int64(),
                )
                .await
                .unwrap();
            assert_eq!(listener.config().tick_interval, Duration::from_millis(5));
            sink.spawn(listener);
        }
        assert_eq!(sink.len(), 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        sink.shutdown();
        sink.join().await;
    }
}
