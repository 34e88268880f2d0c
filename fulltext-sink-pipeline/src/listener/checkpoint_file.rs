//! Durable checkpoint storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use fulltext_sink_shared::Checkpoint;

/// A checkpoint stored in a single 24-byte file.
///
/// Writes go to a sibling temporary file that is synced and then renamed
/// over the old one, so a crash leaves either the previous or the new
/// checkpoint on disk.
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored checkpoint.
    ///
    /// A missing file means nothing was applied yet and yields the default
    /// checkpoint. A file too short to hold a checkpoint is an error.
    pub async fn load(&self) -> std::io::Result<Checkpoint> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No checkpoint file, starting from zero");
                return Ok(Checkpoint::default());
            }
            Err(e) => return Err(e),
        };

        Checkpoint::decode(&raw).ok_or_else(|| {
            warn!(path = %self.path.display(), len = raw.len(), "Checkpoint file is truncated");
            std::io::Error::new(
                ErrorKind::InvalidData,
                format!("checkpoint file {} holds {} bytes", self.path.display(), raw.len()),
            )
        })
    }

    /// Atomically replace the stored checkpoint.
    pub async fn store(&self, checkpoint: &Checkpoint) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&checkpoint.encode()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &self.path).await
    }
}
