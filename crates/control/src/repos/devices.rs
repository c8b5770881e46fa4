//! Device repository
//!
//! Devices are identified per user by hardware id and upserted on every
//! session creation, so OS and app version stay current without the client
//! managing device rows explicitly.

use chrono::Utc;
use tracing::{debug, info};
use turso::Database;

use suburi_model::{DeviceInfo, Platform};

use crate::error::{ControlError, Result};
use crate::repos::row::{cell_i64, cell_text, opt_string};

/// Device repository
pub struct DeviceRepo<'a> {
    db: &'a Database,
}

impl<'a> DeviceRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert or update the device for (user, hw_id), returning its id
    pub async fn upsert(&self, user_id: &str, info: &DeviceInfo) -> Result<i64> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                "SELECT device_id FROM devices WHERE user_id = ?1 AND hw_id = ?2",
                [user_id, info.hw_id.as_str()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            let device_id: i64 = row.get(0)?;
            let id_str = device_id.to_string();

            conn.execute(
                r#"
                UPDATE devices
                SET platform = ?1, model = ?2, os_version = ?3, app_version = ?4
                WHERE device_id = ?5
                "#,
                [
                    info.platform.as_str(),
                    info.model.as_deref().unwrap_or(""),
                    info.os_version.as_deref().unwrap_or(""),
                    info.app_version.as_deref().unwrap_or(""),
                    id_str.as_str(),
                ],
            )
            .await?;

            debug!(device_id, user_id, "Updated existing device");
            return Ok(device_id);
        }

        conn.execute(
            r#"
            INSERT INTO devices (user_id, platform, model, os_version, app_version, hw_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            [
                user_id,
                info.platform.as_str(),
                info.model.as_deref().unwrap_or(""),
                info.os_version.as_deref().unwrap_or(""),
                info.app_version.as_deref().unwrap_or(""),
                info.hw_id.as_str(),
                Utc::now().to_rfc3339().as_str(),
            ],
        )
        .await?;

        let mut rows = conn.query("SELECT last_insert_rowid()", ()).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| ControlError::invalid("device_id", "no rowid after insert"))?;
        let device_id: i64 = row.get(0)?;

        info!(device_id, user_id, platform = info.platform.as_str(), "Created device");
        Ok(device_id)
    }

    /// Fetch device info by id
    pub async fn get(&self, device_id: i64) -> Result<Option<DeviceInfo>> {
        let conn = self.db.connect()?;
        let id_str = device_id.to_string();

        let mut rows = conn
            .query(
                r#"
                SELECT platform, model, os_version, app_version, hw_id
                FROM devices WHERE device_id = ?1
                "#,
                [id_str.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let platform_str: String = row.get(0)?;
        let platform = Platform::parse(&platform_str)
            .map_err(|e| ControlError::invalid("platform", e.to_string()))?;

        Ok(Some(DeviceInfo {
            platform,
            model: opt_string(cell_text(&row, 1)?),
            os_version: opt_string(cell_text(&row, 2)?),
            app_version: opt_string(cell_text(&row, 3)?),
            hw_id: row.get(4)?,
        }))
    }

    /// Count devices (test support)
    pub async fn count(&self) -> Result<i64> {
        let conn = self.db.connect()?;
        let mut rows = conn.query("SELECT COUNT(*) FROM devices", ()).await?;
        match rows.next().await? {
            Some(row) => cell_i64(&row, 0),
            None => Ok(0),
        }
    }
}
