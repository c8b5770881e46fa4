//! Object store trait

use async_trait::async_trait;

use crate::error::Result;

/// Minimal blob store interface
///
/// Paths are forward-slash separated keys relative to the store root, e.g.
/// `users/u1/sessions/42/chunk-000001.jsonl`. The interface is intentionally
/// small: finalize verification needs existence and size, uploads need put.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a blob, replacing any existing content at the path
    async fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Size in bytes of the blob at `path`, or `None` if absent
    async fn head(&self, path: &str) -> Result<Option<u64>>;

    /// Whether a blob exists at `path`
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.head(path).await?.is_some())
    }
}
