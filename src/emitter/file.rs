//! Filesystem sink: one pretty-printed JSON file per bundle

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::bundle::types::EvidenceBundle;
use crate::emitter::SinkReceipt;
use crate::error::{ConnectorError, Result};

#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the bundle is written to; re-emitting a bundle overwrites it
    pub fn bundle_path(&self, bundle_id: &str) -> PathBuf {
        self.directory.join(format!("bundle-{}.json", bundle_id))
    }

    pub async fn write(&self, bundle: &EvidenceBundle) -> Result<SinkReceipt> {
        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            ConnectorError::SinkError(format!(
                "Failed to create bundle directory {:?}: {}",
                self.directory, e
            ))
        })?;

        let path = self.bundle_path(&bundle.bundle_id);
        let json = serde_json::to_vec_pretty(bundle)?;
        debug!("Writing {} bytes to {:?}", json.len(), path);

        tokio::fs::write(&path, json).await.map_err(|e| {
            ConnectorError::SinkError(format!("Failed to write bundle to {:?}: {}", path, e))
        })?;

        info!("Wrote bundle {} to {:?}", bundle.bundle_id, path);
        Ok(SinkReceipt {
            destination: path.display().to_string(),
            file_path: Some(path),
            response: None,
        })
    }
}
