//! Database connection and schema management
//!
//! Uses Turso (async SQLite-compatible) for the session catalog. The schema
//! is created on open; all mutating operations rely on the UNIQUE
//! constraints below for idempotency under concurrent retries.

use tracing::info;
use turso::{Builder, Database};

use crate::error::{ControlError, Result};
use crate::repos::{
    devices::DeviceRepo, files::FileRepo, sessions::SessionRepo, stats::StatsRepo,
    uploads::UploadLedger,
};

/// Session catalog database
///
/// Cheap to share behind an `Arc`; repositories borrow the database and are
/// constructed per call.
pub struct Catalog {
    db: Database,
}

impl Catalog {
    /// Open (or create) a file-based catalog
    pub async fn new(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ControlError::invalid("data_dir", format!("failed to create directory: {}", e))
            })?;
        }

        info!(path, "Opening session catalog");
        let db = Builder::new_local(path).build().await?;

        let catalog = Self { db };
        catalog.init_schema().await?;
        Ok(catalog)
    }

    /// Create an in-memory catalog (for testing)
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let catalog = Self { db };
        catalog.init_schema().await?;
        Ok(catalog)
    }

    pub fn devices(&self) -> DeviceRepo<'_> {
        DeviceRepo::new(&self.db)
    }

    pub fn sessions(&self) -> SessionRepo<'_> {
        SessionRepo::new(&self.db)
    }

    pub fn files(&self) -> FileRepo<'_> {
        FileRepo::new(&self.db)
    }

    pub fn stats(&self) -> StatsRepo<'_> {
        StatsRepo::new(&self.db)
    }

    pub fn uploads(&self) -> UploadLedger<'_> {
        UploadLedger::new(&self.db)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.db.connect()?;

        conn.execute(SCHEMA_DEVICES, ()).await?;
        conn.execute(SCHEMA_SESSIONS, ()).await?;
        conn.execute(SCHEMA_CLIENT_UPLOADS, ()).await?;
        conn.execute(SCHEMA_SESSION_FILES, ()).await?;
        conn.execute(SCHEMA_SESSION_STATS, ()).await?;

        conn.execute(INDEX_SESSIONS_USER, ()).await?;
        conn.execute(INDEX_FILES_SESSION, ()).await?;

        info!("Catalog schema initialized");
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

const SCHEMA_DEVICES: &str = r#"
CREATE TABLE IF NOT EXISTS devices (
    device_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    platform TEXT NOT NULL,
    model TEXT,
    os_version TEXT,
    app_version TEXT,
    hw_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, hw_id)
)
"#;

// game_session_id is an informational foreign key into an external system;
// no constraint on purpose (the referenced record may be deleted).
const SCHEMA_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS capture_sessions (
    session_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    device_id INTEGER NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT,
    nominal_hz TEXT,
    actual_mean_hz TEXT,
    coord_frame TEXT NOT NULL DEFAULT 'device',
    gravity_removed INTEGER NOT NULL DEFAULT 1,
    game_session_id TEXT,
    action_type TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (device_id) REFERENCES devices(device_id) ON DELETE CASCADE
)
"#;

// The idempotency ledger: retried CreateSession calls for one logical
// capture land on the UNIQUE pair and return the recorded session.
const SCHEMA_CLIENT_UPLOADS: &str = r#"
CREATE TABLE IF NOT EXISTS client_uploads (
    session_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    client_upload_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, client_upload_id),
    FOREIGN KEY (session_id) REFERENCES capture_sessions(session_id) ON DELETE CASCADE
)
"#;

const SCHEMA_SESSION_FILES: &str = r#"
CREATE TABLE IF NOT EXISTS session_files (
    file_id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    purpose TEXT NOT NULL,
    storage_url TEXT NOT NULL,
    content_type TEXT,
    bytes_size INTEGER NOT NULL DEFAULT 0,
    sha256_hex TEXT,
    num_samples INTEGER,
    created_at TEXT NOT NULL,
    UNIQUE (session_id, purpose, storage_url),
    FOREIGN KEY (session_id) REFERENCES capture_sessions(session_id) ON DELETE CASCADE
)
"#;

const SCHEMA_SESSION_STATS: &str = r#"
CREATE TABLE IF NOT EXISTS session_stats (
    session_id INTEGER PRIMARY KEY,
    samples_total INTEGER NOT NULL,
    duration_ms TEXT NOT NULL,
    mean_hz TEXT NOT NULL,
    dt_ms_p50 TEXT NOT NULL,
    dt_ms_p95 TEXT NOT NULL,
    dt_ms_max TEXT NOT NULL,
    dropped_seq_pct TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (session_id) REFERENCES capture_sessions(session_id) ON DELETE CASCADE
)
"#;

const INDEX_SESSIONS_USER: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON capture_sessions(user_id)";

const INDEX_FILES_SESSION: &str =
    "CREATE INDEX IF NOT EXISTS idx_files_session ON session_files(session_id)";
