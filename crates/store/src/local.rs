//! Filesystem-backed object store

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::object_store::ObjectStore;

/// Object store rooted at a local directory
///
/// Keys map directly to paths under the root; parent directories are
/// created on write.
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a storage key to a filesystem path, rejecting traversal.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        let traversal = rel.components().any(|c| {
            !matches!(c, Component::Normal(_))
        });
        if path.is_empty() || traversal {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, data).await?;
        debug!(path, bytes = data.len(), "stored blob");
        Ok(())
    }

    async fn head(&self, path: &str) -> Result<Option<u64>> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
