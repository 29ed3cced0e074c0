//! Local-filesystem storage writer.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    client::StorageWriter,
    error::{stage::StageError, Error},
    model::config::{StorageConfig, StorageDestination},
};

/// [`StorageWriter`] implementation for the local-filesystem destination.
///
/// Writes processed assets into the configured directory and returns the absolute
/// file path as the durable reference. Refuses non-local destination tags so a
/// misconfigured task fails its persist stage rather than silently writing to disk.
#[derive(Debug, Clone, Default)]
pub struct LocalStorageWriter;

impl LocalStorageWriter {
    /// Creates a local storage writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageWriter for LocalStorageWriter {
    async fn save(
        &self,
        image: &[u8],
        filename: &str,
        config: &StorageConfig,
    ) -> Result<String, Error> {
        let StorageDestination::Local { directory } = &config.destination else {
            return Err(StageError::Persist(format!(
                "local storage writer cannot handle {} destination",
                config.destination_name()
            ))
            .into());
        };

        let dir = PathBuf::from(directory);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StageError::Persist(format!("failed to create {}: {e}", dir.display())))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, image)
            .await
            .map_err(|e| StageError::Persist(format!("failed to write {}: {e}", path.display())))?;

        Ok(path.display().to_string())
    }
}
