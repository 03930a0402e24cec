//! Blob storage targets for `FTPCopyFileToBlob`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use wharf_pool::BoxError;

/// Destination for files copied off an FTP server.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` as blob `name` in `container`, replacing any existing blob.
    async fn upload(
        &self,
        connection_string: &str,
        container: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), BoxError>;
}

fn check_segment(kind: &str, value: &str) -> Result<(), BoxError> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(format!("invalid {kind} name: {value:?}").into());
    }
    Ok(())
}

/// Blob store backed by a local directory.
///
/// The connection string is the root directory, optionally prefixed with
/// `file://`; containers are subdirectories.
#[derive(Debug, Clone, Default)]
pub struct FsBlobStore;

impl FsBlobStore {
    /// Create a store.
    pub fn new() -> Self {
        Self
    }

    fn target(connection_string: &str, container: &str, name: &str) -> Result<PathBuf, BoxError> {
        let root = connection_string
            .strip_prefix("file://")
            .unwrap_or(connection_string);
        if root.is_empty() {
            return Err("empty storage connection string".into());
        }
        check_segment("container", container)?;
        check_segment("blob", name)?;
        Ok(Path::new(root).join(container).join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(
        &self,
        connection_string: &str,
        container: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), BoxError> {
        let target = Self::target(connection_string, container, name)?;
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&target, data).await?;
        tracing::debug!(path = %target.display(), "blob written");
        Ok(())
    }
}

/// Blob store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of `container/name`.
    pub fn get(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .get(&(container.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        _connection_string: &str,
        container: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), BoxError> {
        check_segment("container", container)?;
        check_segment("blob", name)?;
        self.blobs
            .lock()
            .insert((container.to_string(), name.to_string()), data);
        Ok(())
    }
}
