//! Session file repository
//!
//! File rows are created during finalize, one per manifest entry. The
//! UNIQUE (session, purpose, storage_url) constraint makes registration an
//! idempotent upsert: a finalize replay re-registers nothing.

use chrono::Utc;
use tracing::debug;
use turso::Database;

use suburi_model::{FilePurpose, SessionFile};

use crate::error::{ControlError, Result};
use crate::repos::row::{cell_i64, cell_opt_i64, cell_text, opt_string, parse_utc};

/// A file registration (manifest entry resolved to a storage path)
#[derive(Debug, Clone)]
pub struct NewSessionFile {
    pub purpose: FilePurpose,
    pub storage_url: String,
    pub content_type: Option<String>,
    pub bytes_size: i64,
    pub sha256_hex: Option<String>,
    pub num_samples: Option<i64>,
}

/// Aggregate totals over a session's registered files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTotals {
    pub total_files: i64,
    pub total_bytes: i64,
    pub total_samples: i64,
}

/// Session file repository
pub struct FileRepo<'a> {
    db: &'a Database,
}

impl<'a> FileRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a file if not already present (idempotent)
    pub async fn register(&self, session_id: i64, file: &NewSessionFile) -> Result<()> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();

        let mut existing = conn
            .query(
                r#"
                SELECT file_id FROM session_files
                WHERE session_id = ?1 AND purpose = ?2 AND storage_url = ?3
                "#,
                [id_str.as_str(), file.purpose.as_str(), file.storage_url.as_str()],
            )
            .await?;

        if existing.next().await?.is_some() {
            debug!(session_id, storage_url = %file.storage_url, "File already registered");
            return Ok(());
        }

        let bytes_str = file.bytes_size.to_string();
        let samples_str = file.num_samples.map(|n| n.to_string()).unwrap_or_default();

        conn.execute(
            r#"
            INSERT INTO session_files
            (session_id, purpose, storage_url, content_type, bytes_size, sha256_hex, num_samples, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            [
                id_str.as_str(),
                file.purpose.as_str(),
                file.storage_url.as_str(),
                file.content_type.as_deref().unwrap_or(""),
                bytes_str.as_str(),
                file.sha256_hex.as_deref().unwrap_or(""),
                samples_str.as_str(),
                Utc::now().to_rfc3339().as_str(),
            ],
        )
        .await?;

        debug!(session_id, storage_url = %file.storage_url, "Registered session file");
        Ok(())
    }

    /// All files for a session, ordered by purpose then registration time
    pub async fn list_for_session(&self, session_id: i64) -> Result<Vec<SessionFile>> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();

        let mut rows = conn
            .query(
                r#"
                SELECT file_id, session_id, purpose, storage_url, content_type,
                       bytes_size, sha256_hex, num_samples, created_at
                FROM session_files
                WHERE session_id = ?1
                ORDER BY purpose, created_at
                "#,
                [id_str.as_str()],
            )
            .await?;

        let mut files = Vec::new();
        while let Some(row) = rows.next().await? {
            files.push(Self::row_to_file(&row)?);
        }
        Ok(files)
    }

    /// Totals used for the cached finalize summary
    pub async fn totals(&self, session_id: i64) -> Result<FileTotals> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();

        let mut rows = conn
            .query(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(bytes_size), 0),
                       COALESCE(SUM(num_samples), 0)
                FROM session_files
                WHERE session_id = ?1
                "#,
                [id_str.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(FileTotals {
                total_files: cell_i64(&row, 0)?,
                total_bytes: cell_i64(&row, 1)?,
                total_samples: cell_i64(&row, 2)?,
            }),
            None => Ok(FileTotals::default()),
        }
    }

    fn row_to_file(row: &turso::Row) -> Result<SessionFile> {
        let purpose_str: String = row.get(2)?;
        let purpose = FilePurpose::parse(&purpose_str)
            .map_err(|e| ControlError::invalid("purpose", e.to_string()))?;
        let created_at_str: String = row.get(8)?;

        Ok(SessionFile {
            id: cell_i64(row, 0)?,
            session_id: cell_i64(row, 1)?,
            purpose,
            storage_url: row.get(3)?,
            content_type: opt_string(cell_text(row, 4)?),
            bytes_size: cell_i64(row, 5)?,
            sha256_hex: opt_string(cell_text(row, 6)?),
            num_samples: cell_opt_i64(row, 7)?,
            created_at: parse_utc("created_at", &created_at_str)?,
        })
    }
}
