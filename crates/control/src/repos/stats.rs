//! Rate-stats repository
//!
//! At most one row per session, inserted only when the client supplied the
//! data. The primary key on session_id is the at-most-once mechanism.

use chrono::Utc;
use tracing::{debug, info};
use turso::Database;

use suburi_model::RateStats;

use crate::error::Result;
use crate::repos::row::{bind_f64, cell_i64, cell_text, opt_f64};

/// Rate-stats repository
pub struct StatsRepo<'a> {
    db: &'a Database,
}

impl<'a> StatsRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert stats unless a row already exists.
    ///
    /// Returns `true` when a row was inserted, `false` on idempotent replay.
    pub async fn insert_once(&self, session_id: i64, stats: &RateStats) -> Result<bool> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();

        let mut existing = conn
            .query(
                "SELECT session_id FROM session_stats WHERE session_id = ?1",
                [id_str.as_str()],
            )
            .await?;

        if existing.next().await?.is_some() {
            debug!(session_id, "Rate stats already recorded");
            return Ok(false);
        }

        let samples_str = stats.samples_total.to_string();
        let duration = stats.duration_ms.to_string();
        let mean = stats.mean_hz.to_string();
        let p50 = stats.dt_ms_p50.to_string();
        let p95 = stats.dt_ms_p95.to_string();
        let max = stats.dt_ms_max.to_string();
        let dropped = bind_f64(stats.dropped_seq_pct);

        conn.execute(
            r#"
            INSERT INTO session_stats
            (session_id, samples_total, duration_ms, mean_hz, dt_ms_p50, dt_ms_p95, dt_ms_max, dropped_seq_pct, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            [
                id_str.as_str(),
                samples_str.as_str(),
                duration.as_str(),
                mean.as_str(),
                p50.as_str(),
                p95.as_str(),
                max.as_str(),
                dropped.as_str(),
                Utc::now().to_rfc3339().as_str(),
            ],
        )
        .await?;

        info!(session_id, mean_hz = stats.mean_hz, "Stored rate stats");
        Ok(true)
    }

    /// Fetch a session's rate stats, if recorded
    pub async fn get(&self, session_id: i64) -> Result<Option<RateStats>> {
        let conn = self.db.connect()?;
        let id_str = session_id.to_string();

        let mut rows = conn
            .query(
                r#"
                SELECT samples_total, duration_ms, mean_hz, dt_ms_p50, dt_ms_p95, dt_ms_max, dropped_seq_pct
                FROM session_stats
                WHERE session_id = ?1
                "#,
                [id_str.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let duration_str: String = row.get(1)?;
        let mean_str: String = row.get(2)?;
        let p50_str: String = row.get(3)?;
        let p95_str: String = row.get(4)?;
        let max_str: String = row.get(5)?;
        let dropped_str: String = cell_text(&row, 6)?;

        Ok(Some(RateStats {
            samples_total: cell_i64(&row, 0)?,
            duration_ms: opt_f64(&duration_str).unwrap_or(0.0),
            mean_hz: opt_f64(&mean_str).unwrap_or(0.0),
            dt_ms_p50: opt_f64(&p50_str).unwrap_or(0.0),
            dt_ms_p95: opt_f64(&p95_str).unwrap_or(0.0),
            dt_ms_max: opt_f64(&max_str).unwrap_or(0.0),
            dropped_seq_pct: opt_f64(&dropped_str),
        }))
    }
}
