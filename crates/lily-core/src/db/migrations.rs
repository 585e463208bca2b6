//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 4;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        apply(conn, 1, &V1).await?;
    }
    if version < 2 {
        apply(conn, 2, &V2).await?;
    }
    if version < 3 {
        apply(conn, 3, &V3).await?;
    }
    if version < 4 {
        apply(conn, 4, &V4).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Version 1: schema tracking and the expenses table
const V1: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS expenses (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL DEFAULT '',
        amount_cents INTEGER NOT NULL,
        category TEXT NOT NULL,
        note TEXT,
        expense_date TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        pending INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date DESC, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_pending ON expenses(pending)",
];

/// Version 2: meeting notes
const V2: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS meeting_notes (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL DEFAULT '',
        meeting_title TEXT NOT NULL,
        audio_file_url TEXT,
        local_audio_path TEXT,
        transcript_text TEXT,
        duration_secs INTEGER NOT NULL DEFAULT 0,
        transcription_status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        pending INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_meeting_notes_created ON meeting_notes(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_meeting_notes_pending ON meeting_notes(pending)",
];

/// Version 3: track whether a meeting recording reached the server
const V3: [&str; 1] =
    ["ALTER TABLE meeting_notes ADD COLUMN audio_uploaded INTEGER NOT NULL DEFAULT 0"];

/// Version 4: single-row lease so one sweep runs per database file
const V4: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS sync_lease (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        holder TEXT,
        acquired_at_ms INTEGER
    )",
    "INSERT OR IGNORE INTO sync_lease (id) VALUES (1)",
];

/// Apply one migration's statements and record its version atomically
async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute("INSERT INTO schema_version (version) VALUES (?)", libsql::params![version])
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} (target {CURRENT_VERSION})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    async fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut rows = conn
            .query(&format!("PRAGMA table_info({table})"), ())
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(1).unwrap());
        }
        names
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap(); // Should not fail

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migration_v3_adds_audio_uploaded_with_default() {
        let conn = setup().await;
        apply(&conn, 1, &V1).await.unwrap();
        apply(&conn, 2, &V2).await.unwrap();
        conn.execute(
            "INSERT INTO meeting_notes (id, meeting_title, created_at, updated_at)
             VALUES ('n1', 'Standup', '2024-03-01T00:00:00.000Z', '2024-03-01T00:00:00.000Z')",
            (),
        )
        .await
        .unwrap();

        run(&conn).await.unwrap();

        assert!(column_names(&conn, "meeting_notes")
            .await
            .contains(&"audio_uploaded".to_string()));
        let mut rows = conn
            .query("SELECT audio_uploaded FROM meeting_notes WHERE id = 'n1'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i32>(0).unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migration_v4_seeds_free_lease() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT COUNT(*), MAX(holder IS NULL) FROM sync_lease", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
        assert_eq!(row.get::<i64>(1).unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_expenses_table_has_pending_column() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        assert!(column_names(&conn, "expenses")
            .await
            .contains(&"pending".to_string()));
    }
}
