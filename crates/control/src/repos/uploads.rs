//! Client-upload idempotency ledger
//!
//! Maps (user, client_upload_id) to the session that first recorded it.
//! Retried CreateSession calls look up here before creating anything.

use turso::Database;

use crate::error::Result;
use crate::repos::row::cell_i64;

/// Idempotency ledger
pub struct UploadLedger<'a> {
    db: &'a Database,
}

impl<'a> UploadLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find the session previously recorded for this upload id, if any
    pub async fn find_session(
        &self,
        user_id: &str,
        client_upload_id: &str,
    ) -> Result<Option<i64>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                r#"
                SELECT session_id FROM client_uploads
                WHERE user_id = ?1 AND client_upload_id = ?2
                "#,
                [user_id, client_upload_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(cell_i64(&row, 0)?)),
            None => Ok(None),
        }
    }
}
