//! Resume journal
//!
//! A small durable work queue mapping chunk files to upload state. Every
//! rotation and every upload completion rewrites the journal atomically
//! (temp file + rename), so a crash at any point leaves either the old or
//! the new journal, never a torn one. Process start scans for journals and
//! resumes or discards them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use suburi_model::{CreateSessionRequest, RateStats};

use crate::error::Result;

/// Journal file name inside a session directory
pub const JOURNAL_FILE: &str = "journal.json";

/// Upload state of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkState {
    /// Written locally, not yet uploaded
    Pending,
    /// Confirmed stored by the server
    Uploaded,
}

/// One chunk's journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub filename: String,
    pub bytes_size: i64,
    pub sha256_hex: String,
    pub num_samples: i64,
    pub state: ChunkState,
}

/// Durable record of an in-flight capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    /// The original create request - replayed verbatim on resume so the
    /// server's idempotency ledger re-attaches the same session
    pub create_request: CreateSessionRequest,
    /// Server session id, once known
    pub session_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// Whether recording finished cleanly (stats below are then final)
    pub recording_complete: bool,
    pub end_time_utc: Option<DateTime<Utc>>,
    pub rate_stats: Option<RateStats>,
    pub chunks: Vec<ChunkEntry>,
}

impl Journal {
    pub fn new(create_request: CreateSessionRequest, session_id: Option<i64>) -> Self {
        Self {
            create_request,
            session_id,
            created_at: Utc::now(),
            recording_complete: false,
            end_time_utc: None,
            rate_stats: None,
            chunks: Vec::new(),
        }
    }

    /// Atomically persist to `dir/journal.json`
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILE);
        let tmp = dir.join(format!(".{}.tmp", JOURNAL_FILE));

        let body = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Load from `dir/journal.json`
    pub fn load(dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(dir.join(JOURNAL_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Whether a journal exists in the directory
    pub fn exists(dir: &Path) -> bool {
        dir.join(JOURNAL_FILE).is_file()
    }

    /// Age of the journal (staleness check for resume)
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Chunks still awaiting upload
    pub fn pending(&self) -> Vec<ChunkEntry> {
        self.chunks
            .iter()
            .filter(|c| c.state == ChunkState::Pending)
            .cloned()
            .collect()
    }

    /// Mark one chunk uploaded
    pub fn mark_uploaded(&mut self, filename: &str) {
        if let Some(entry) = self.chunks.iter_mut().find(|c| c.filename == filename) {
            entry.state = ChunkState::Uploaded;
        }
    }

    /// Paths of this journal's chunk files within `dir`
    pub fn chunk_paths(&self, dir: &Path) -> Vec<PathBuf> {
        self.chunks.iter().map(|c| dir.join(&c.filename)).collect()
    }
}
