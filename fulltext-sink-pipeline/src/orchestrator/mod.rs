//! Orchestrator module for the sink pipeline.
//!
//! Drives a listener on a fixed tick until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::listener::{Listener, TickOutcome};

/// Worker task for one partition.
///
/// Each tick applies at most one window and awaits the bulk request, so a
/// partition never has more than one batch in flight. Shutdown is only
/// observed between ticks: a window that has started is finished (or fails
/// on its timeout) before the worker exits.
pub struct ListenerWorker {
    listener: Arc<Listener>,
    tick_interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ListenerWorker {
    /// Create a worker ticking at the listener's configured interval.
    pub fn new(listener: Arc<Listener>, shutdown_rx: broadcast::Receiver<()>) -> Self {
        let tick_interval = listener.config().tick_interval;
        Self {
            listener,
            tick_interval,
            shutdown_rx,
        }
    }

    /// Run until a shutdown signal is received or its sender is dropped.
    #[instrument(skip(self), fields(partition = self.listener.partition()))]
    pub async fn run(mut self) {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "Starting listener worker");

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    match self.listener.process_logs().await {
                        Ok(TickOutcome::Applied { up_to, documents, .. }) => {
                            debug!(up_to = up_to, documents = documents, "Tick applied");
                        }
                        Ok(TickOutcome::Idle) => {}
                        Err(e) => {
                            error!(error = %e, "Tick failed, retrying on next tick");
                        }
                    }
                }
            }
        }

        let last_apply_log_id = self.listener.last_apply_log_id().await;
        info!(
            last_apply_log_id = last_apply_log_id,
            "Listener worker stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListenerConfig;
    use crate::consumer::LogEntry;
    use crate::listener::test_support::{open_listener, vertex_put, MemoryLog, MockSearchClient};
    use fulltext_sink_repository::SearchError;
    use tempfile::TempDir;

    async fn wait_for_apply(listener: &Listener, log_id: u64) {
        for _ in 0..200 {
            if listener.last_apply_log_id().await >= log_id {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("listener did not reach log id {}", log_id);
    }

    #[tokio::test]
    async fn test_worker_ticks_at_listener_interval() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(Vec::new());
        let client = Arc::new(MockSearchClient::default());
        let config = ListenerConfig::default().with_tick_interval(Duration::from_millis(7));
        let listener = Arc::new(open_listener(&dir, log, client, config).await);

        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let worker = ListenerWorker::new(listener, shutdown_rx);
        assert_eq!(worker.tick_interval, Duration::from_millis(7));
    }

    #[tokio::test]
    async fn test_worker_applies_and_stops() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![
            LogEntry::new(1, 1, vertex_put(1, "a")),
            LogEntry::new(2, 1, vertex_put(2, "b")),
        ]);
        let client = Arc::new(MockSearchClient::default());
        let config = ListenerConfig::default().with_tick_interval(Duration::from_millis(10));
        let listener = Arc::new(open_listener(&dir, log, client.clone(), config).await);
        listener.on_committed(2, 1).await;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let worker = ListenerWorker::new(listener.clone(), shutdown_rx);
        let handle = tokio::spawn(worker.run());

        wait_for_apply(&listener, 2).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(client.bulk_count().await, 1);
    }

    #[tokio::test]
    async fn test_worker_retries_failed_tick() {
        let dir = TempDir::new().unwrap();
        let log = MemoryLog::new(vec![LogEntry::new(1, 1, vertex_put(1, "a"))]);
        let client = Arc::new(MockSearchClient::default());
        client.fail_next(SearchError::transport("timed out")).await;
        client.fail_next(SearchError::application("{}")).await;
        let config = ListenerConfig::default().with_tick_interval(Duration::from_millis(5));
        let listener = Arc::new(open_listener(&dir, log.clone(), client.clone(), config).await);
        listener.on_committed(1, 1).await;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(ListenerWorker::new(listener.clone(), shutdown_rx).run());

        wait_for_apply(&listener, 1).await;
        drop(shutdown_tx);
        handle.await.unwrap();

        assert_eq!(log.reads(), vec![(1, 1), (1, 1), (1, 1)]);
    }
}
