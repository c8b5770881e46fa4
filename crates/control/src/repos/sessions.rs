//! Session repository
//!
//! Capture sessions are created open (no end time) and finalized exactly
//! once. Creation and ledger registration happen in one transaction so a
//! concurrent retry cannot observe a session without its idempotency row.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use turso::Database;

use suburi_model::{CaptureSession, CoordFrame, CreateSessionRequest};

use crate::error::{ControlError, Result};
use crate::repos::row::{
    bind_f64, cell_i64, cell_text, opt_f64, opt_string, parse_opt_utc, parse_utc,
};

const SESSION_COLUMNS: &str = r#"
session_id, user_id, device_id, start_time, end_time, nominal_hz,
actual_mean_hz, coord_frame, gravity_removed, game_session_id,
action_type, notes, created_at
"#;

/// Session repository
pub struct SessionRepo<'a> {
    db: &'a Database,
}

impl<'a> SessionRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a session and its ledger row atomically.
    ///
    /// Returns `AlreadyExists` when the (user, client_upload_id) pair lost
    /// a race to a concurrent insert - the caller re-reads the winner. The
    /// retry's payload is intentionally ignored in that case: the first
    /// recorded session wins.
    pub async fn create_with_ledger(
        &self,
        user_id: &str,
        device_id: i64,
        req: &CreateSessionRequest,
    ) -> Result<CaptureSession> {
        let conn = self.db.connect()?;
        let now = Utc::now().to_rfc3339();
        let device_id_str = device_id.to_string();
        let nominal_hz = bind_f64(req.nominal_hz);

        conn.execute("BEGIN IMMEDIATE", ()).await?;

        let inserted = conn
            .execute(
                r#"
                INSERT INTO capture_sessions
                (user_id, device_id, start_time, nominal_hz, coord_frame,
                 gravity_removed, game_session_id, action_type, notes, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                [
                    user_id,
                    device_id_str.as_str(),
                    req.start_time_utc.to_rfc3339().as_str(),
                    nominal_hz.as_str(),
                    req.coord_frame.as_str(),
                    if req.gravity_removed { "1" } else { "0" },
                    req.game_session_id.as_deref().unwrap_or(""),
                    req.action_type.as_deref().unwrap_or(""),
                    req.notes.as_deref().unwrap_or(""),
                    now.as_str(),
                ],
            )
            .await;

        if let Err(e) = inserted {
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(e.into());
        }

        let mut rows = conn.query("SELECT last_insert_rowid()", ()).await?;
        let session_id: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => {
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(ControlError::invalid("session_id", "no rowid after insert"));
            }
        };
        let session_id_str = session_id.to_string();

        let ledger = conn
            .execute(
                r#"
                INSERT INTO client_uploads (session_id, user_id, client_upload_id, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                [
                    session_id_str.as_str(),
                    user_id,
                    req.client_upload_id.as_str(),
                    now.as_str(),
                ],
            )
            .await;

        if let Err(e) = ledger {
            let _ = conn.execute("ROLLBACK", ()).await;
            if e.to_string().contains("UNIQUE constraint") {
                return Err(ControlError::already_exists(
                    "client_upload",
                    &req.client_upload_id,
                ));
            }
            return Err(e.into());
        }

        conn.execute("COMMIT", ()).await?;

        info!(
            session_id,
            user_id,
            client_upload_id = %req.client_upload_id,
            "Created capture session"
        );

        self.get(session_id)
            .await?
            .ok_or_else(|| ControlError::not_found("session", session_id_str))
    }

    /// Get a session by id
    pub async fn get(&self, session_id: i64) -> Result<Option<CaptureSession>> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM capture_sessions WHERE session_id = ?1",
                    SESSION_COLUMNS
                ),
                [id_str.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    /// List a user's sessions, newest first, with per-session file counts
    pub async fn list(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<(CaptureSession, i64)>> {
        let conn = self.db.connect()?;
        let limit_str = limit.to_string();
        let offset_str = offset.to_string();

        let mut rows = conn
            .query(
                &format!(
                    r#"
                    SELECT {},
                        (SELECT COUNT(*) FROM session_files f
                         WHERE f.session_id = capture_sessions.session_id) AS file_count
                    FROM capture_sessions
                    WHERE user_id = ?1
                    ORDER BY session_id DESC
                    LIMIT ?2 OFFSET ?3
                    "#,
                    SESSION_COLUMNS
                ),
                [user_id, limit_str.as_str(), offset_str.as_str()],
            )
            .await?;

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            let session = Self::row_to_session(&row)?;
            let file_count = cell_i64(&row, 13)?;
            sessions.push((session, file_count));
        }

        Ok(sessions)
    }

    /// Set end time and measured mean rate; the single allowed mutation.
    pub async fn finalize(
        &self,
        session_id: i64,
        end_time: DateTime<Utc>,
        actual_mean_hz: Option<f64>,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();
        let mean = bind_f64(actual_mean_hz);

        let affected = conn
            .execute(
                r#"
                UPDATE capture_sessions
                SET end_time = ?1, actual_mean_hz = ?2
                WHERE session_id = ?3
                "#,
                [end_time.to_rfc3339().as_str(), mean.as_str(), id_str.as_str()],
            )
            .await?;

        if affected == 0 {
            return Err(ControlError::not_found("session", id_str));
        }

        debug!(session_id, "Finalized session");
        Ok(())
    }

    fn row_to_session(row: &turso::Row) -> Result<CaptureSession> {
        let start_time_str: String = row.get(3)?;
        let end_time_str: String = cell_text(row, 4)?;
        let nominal_hz_str: String = cell_text(row, 5)?;
        let actual_mean_hz_str: String = cell_text(row, 6)?;
        let coord_frame_str: String = row.get(7)?;
        let created_at_str: String = row.get(12)?;

        let coord_frame = CoordFrame::parse(&coord_frame_str)
            .map_err(|e| ControlError::invalid("coord_frame", e.to_string()))?;

        Ok(CaptureSession {
            id: cell_i64(row, 0)?,
            user_id: row.get(1)?,
            device_id: cell_i64(row, 2)?,
            start_time: parse_utc("start_time", &start_time_str)?,
            end_time: parse_opt_utc("end_time", &end_time_str)?,
            nominal_hz: opt_f64(&nominal_hz_str),
            actual_mean_hz: opt_f64(&actual_mean_hz_str),
            coord_frame,
            gravity_removed: cell_i64(row, 8)? != 0,
            game_session_id: opt_string(cell_text(row, 9)?),
            action_type: opt_string(cell_text(row, 10)?),
            notes: opt_string(cell_text(row, 11)?),
            created_at: parse_utc("created_at", &created_at_str)?,
        })
    }
}
