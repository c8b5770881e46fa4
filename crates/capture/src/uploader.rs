//! Chunk uploader
//!
//! Bounded-concurrency uploads with exponential backoff. Default
//! concurrency is 2 simultaneous transfers - enough to keep a mobile radio
//! busy without saturating it. Each chunk retries independently; a chunk
//! that exhausts its attempts parks as pending ("queued for later") rather
//! than failing the session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use suburi_model::CapabilityGrant;

use crate::client::IngestClient;
use crate::error::{CaptureError, Result};
use crate::journal::{ChunkEntry, ChunkState, Journal};

/// Exponential backoff policy for chunk uploads
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// First retry delay; doubles each attempt
    pub base_delay: Duration,
    /// Attempts before a chunk parks as queued
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (0-based), capped at 64x base
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(6))
    }
}

/// Outcome of an upload pass
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    /// Chunks still pending after retries were exhausted or cancelled
    pub queued: Vec<String>,
}

impl UploadReport {
    pub fn all_uploaded(&self) -> bool {
        self.queued.is_empty()
    }
}

/// Uploads a session's pending chunks
pub struct Uploader {
    client: IngestClient,
    policy: RetryPolicy,
    concurrency: usize,
}

impl Uploader {
    pub fn new(client: IngestClient, policy: RetryPolicy, concurrency: usize) -> Self {
        Self {
            client,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Upload every pending chunk in the journal, updating states in place
    /// and persisting the journal after each completion.
    ///
    /// Already-uploaded chunks are never re-sent. Cancellation aborts
    /// in-flight transfers; completed uploads remain valid.
    pub async fn upload_pending(
        &self,
        grant: &CapabilityGrant,
        journal: &mut Journal,
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<UploadReport> {
        let pending = journal.pending();
        let mut report = UploadReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(pending.len());

        for entry in pending {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let grant = grant.clone();
            let policy = self.policy.clone();
            let cancel = cancel.clone();
            let path = dir.join(&entry.filename);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore is never closed");
                let ok = upload_with_retry(&client, &grant, &entry, &path, &policy, &cancel).await;
                (entry.filename, ok)
            }));
        }

        for handle in handles {
            let (filename, ok) = handle
                .await
                .map_err(|e| CaptureError::Internal(format!("upload task panicked: {}", e)))?;

            if ok {
                journal.mark_uploaded(&filename);
                journal.save(dir)?;
                report.uploaded.push(filename);
            } else {
                report.queued.push(filename);
            }
        }

        Ok(report)
    }
}

/// Upload one chunk, retrying transient failures with backoff.
///
/// Returns false when the chunk should stay queued (retries exhausted,
/// cancelled, disk unreadable, or a non-retryable rejection).
async fn upload_with_retry(
    client: &IngestClient,
    grant: &CapabilityGrant,
    entry: &ChunkEntry,
    path: &Path,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> bool {
    debug_assert_eq!(entry.state, ChunkState::Pending);

    let body = match tokio::fs::read(path).await {
        Ok(body) => body,
        Err(e) => {
            warn!(chunk = %entry.filename, error = %e, "Chunk unreadable, leaving queued");
            return false;
        }
    };

    for attempt in 0..policy.max_attempts {
        if cancel.is_cancelled() {
            debug!(chunk = %entry.filename, "Upload cancelled");
            return false;
        }

        let outcome = tokio::select! {
            r = client.upload_chunk(grant, &entry.filename, body.clone()) => r,
            _ = cancel.cancelled() => return false,
        };

        match outcome {
            Ok(()) => {
                debug!(chunk = %entry.filename, attempt, "Chunk uploaded");
                return true;
            }
            Err(e) if e.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay(attempt);
                warn!(
                    chunk = %entry.filename,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Chunk upload failed, backing off"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return false,
                }
            }
            Err(e) => {
                warn!(chunk = %entry.filename, error = %e, "Chunk upload gave up");
                return false;
            }
        }
    }

    false
}
