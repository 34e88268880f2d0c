//! Dependency initialization and wiring for the full-text sink.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::SinkConfig;
use crate::SinkError;
use fulltext_sink_pipeline::{
    consumer::ReplicatedLog,
    listener::CheckpointFile,
    processor::{DocumentExtractor, RowDecoder, SchemaLookup, VidLayout},
    Listener,
};
use fulltext_sink_repository::{EsAdapter, OpenSearchTransport, SearchEngineClient};
use fulltext_sink_shared::{IndexDescriptor, PartitionId};

/// Shared handles built once per process.
pub struct Dependencies {
    pub config: SinkConfig,
    /// Index adapter over every configured cluster member.
    pub search_client: Arc<EsAdapter>,
}

impl Dependencies {
    /// Build the cluster transport and index adapter.
    ///
    /// No request is sent; unreachable members surface on first use.
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let transport = OpenSearchTransport::new(&config.endpoints, &config.transport)
            .map_err(|e| SinkError::config(format!("Failed to create search transport: {}", e)))?;
        let search_client = Arc::new(EsAdapter::new(
            Arc::new(transport),
            config.endpoints.clone(),
        ));

        info!(endpoints = config.endpoints.len(), "Search cluster client created");
        Ok(Self {
            config,
            search_client,
        })
    }

    /// Checkpoint file location for `partition`.
    pub fn checkpoint_path(&self, partition: PartitionId) -> PathBuf {
        self.config.data_dir.join(format!("part_{}.ckpt", partition))
    }

    /// Create `index` in the cluster unless it already exists.
    pub async fn ensure_index(
        &self,
        index: &IndexDescriptor,
        analyzer: Option<&str>,
    ) -> Result<(), SinkError> {
        if self.search_client.is_index_exist(&index.name).await? {
            return Ok(());
        }
        self.search_client
            .create_index(&index.name, &index.fields, analyzer)
            .await?;
        Ok(())
    }

    /// Open the listener of one partition, resuming from its checkpoint.
    pub async fn open_listener(
        &self,
        partition: PartitionId,
        log: Arc<dyn ReplicatedLog>,
        schema: Arc<dyn SchemaLookup>,
        decoder: Arc<dyn RowDecoder>,
        vid_layout: VidLayout,
    ) -> Result<Arc<Listener>, SinkError> {
        let extractor = DocumentExtractor::new(schema, decoder, vid_layout);
        let listener = Listener::open(
            partition,
            log,
            extractor,
            self.search_client.clone(),
            CheckpointFile::new(self.checkpoint_path(partition)),
            self.config.listener.clone(),
        )
        .await?;
        Ok(Arc::new(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(data_dir: &std::path::Path) -> SinkConfig {
        let data_dir = data_dir.to_string_lossy().into_owned();
        let vars = HashMap::from([("FULLTEXT_DATA_DIR".to_string(), data_dir)]);
        SinkConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_checkpoint_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let deps = Dependencies::new(config(temp_dir.path())).unwrap();

        assert_eq!(deps.checkpoint_path(7), temp_dir.path().join("part_7.ckpt"));
        assert_eq!(deps.search_client.endpoints().len(), 1);
    }
}
