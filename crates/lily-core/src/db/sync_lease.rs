//! Sweep lease shared by every connection to the same database file

use std::time::Duration;

use libsql::{params, Connection};

use crate::error::Result;
use crate::util::now_millis;

/// Claims and releases the single `sync_lease` row.
///
/// A lease older than `stale_after` is treated as abandoned by a process
/// that exited mid-sweep and may be taken over.
pub struct LibSqlSyncLease<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncLease<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Take the lease for `holder`; `false` when someone else holds a live one
    pub async fn try_acquire(&self, holder: &str, stale_after: Duration) -> Result<bool> {
        let now = now_millis().timestamp_millis();
        let stale_ms = i64::try_from(stale_after.as_millis()).unwrap_or(i64::MAX);
        let stale_before = now.saturating_sub(stale_ms);

        let claimed = self
            .conn
            .execute(
                "UPDATE sync_lease SET holder = ?, acquired_at_ms = ?
                 WHERE id = 1 AND (holder IS NULL OR acquired_at_ms < ?)",
                params![holder, now, stale_before],
            )
            .await?;
        Ok(claimed == 1)
    }

    /// Give the lease back; a no-op when `holder` no longer owns it
    pub async fn release(&self, holder: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_lease SET holder = NULL, acquired_at_ms = NULL
                 WHERE id = 1 AND holder = ?",
                [holder],
            )
            .await?;
        Ok(())
    }
}
