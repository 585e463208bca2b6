//! Meeting note store implementation

use libsql::{params, Connection, Row};

use super::store::{
    decode_id, decode_timestamp, encode_timestamp, query_ids_with_prefix, RecordStore,
};
use crate::error::Result;
use crate::models::{MeetingNote, RecordId, TranscriptionStatus};
use crate::util::now_millis;

const NOTE_COLUMNS: &str = "id, user_id, meeting_title, audio_file_url, local_audio_path, transcript_text, duration_secs, transcription_status, created_at, updated_at, pending, audio_uploaded";

/// libSQL implementation of `RecordStore<MeetingNote>`
pub struct LibSqlMeetingNoteStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMeetingNoteStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn insert(conn: &Connection, note: &MeetingNote) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO meeting_notes
                (id, user_id, meeting_title, audio_file_url, local_audio_path, transcript_text,
                 duration_secs, transcription_status, created_at, updated_at, pending, audio_uploaded)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                note.id.as_str(),
                note.user_id.as_str(),
                note.meeting_title.as_str(),
                note.audio_file_url.clone(),
                note.local_audio_path.clone(),
                note.transcript_text.clone(),
                note.duration_secs,
                note.transcription_status.as_str(),
                encode_timestamp(&note.created_at),
                encode_timestamp(&note.updated_at),
                i32::from(note.pending),
                i32::from(note.audio_uploaded)
            ],
        )
        .await?;
        Ok(())
    }

    fn parse_note(row: &Row) -> Result<MeetingNote> {
        Ok(MeetingNote {
            id: decode_id(row.get(0)?)?,
            user_id: row.get(1)?,
            meeting_title: row.get(2)?,
            audio_file_url: row.get(3)?,
            local_audio_path: row.get(4)?,
            transcript_text: row.get(5)?,
            duration_secs: row.get(6)?,
            transcription_status: TranscriptionStatus::from_str_lossy(&row.get::<String>(7)?),
            created_at: decode_timestamp(&row.get::<String>(8)?)?,
            updated_at: decode_timestamp(&row.get::<String>(9)?)?,
            pending: row.get::<i32>(10)? != 0,
            audio_uploaded: row.get::<i32>(11)? != 0,
        })
    }

    async fn query_notes(&self, sql: &str, id: Option<&str>) -> Result<Vec<MeetingNote>> {
        let mut rows = match id {
            Some(id) => self.conn.query(sql, [id]).await?,
            None => self.conn.query(sql, ()).await?,
        };

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(Self::parse_note(&row)?);
        }
        Ok(notes)
    }

    /// Notes whose recording is still only on this device
    pub async fn pending_uploads(&self) -> Result<Vec<MeetingNote>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM meeting_notes
             WHERE audio_uploaded = 0 AND local_audio_path IS NOT NULL
             ORDER BY created_at ASC"
        );
        self.query_notes(&sql, None).await
    }

    /// Record that the recording reached the server
    pub async fn mark_uploaded(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE meeting_notes SET audio_uploaded = 1 WHERE id = ?",
                [id.as_str()],
            )
            .await?;
        Ok(())
    }

    /// Store a finished (or failed) transcription
    pub async fn update_transcription(
        &self,
        id: &RecordId,
        text: Option<&str>,
        status: TranscriptionStatus,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE meeting_notes
                 SET transcript_text = COALESCE(?, transcript_text), transcription_status = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    text.map(str::to_string),
                    status.as_str(),
                    encode_timestamp(&now_millis()),
                    id.as_str()
                ],
            )
            .await?;
        Ok(())
    }
}

impl RecordStore<MeetingNote> for LibSqlMeetingNoteStore<'_> {
    async fn upsert(&self, record: &MeetingNote) -> Result<()> {
        Self::insert(self.conn, record).await
    }

    async fn upsert_all(&self, records: &[MeetingNote]) -> Result<()> {
        let tx = self.conn.transaction().await?;
        for record in records {
            Self::insert(&tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<MeetingNote>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM meeting_notes WHERE id = ?");
        Ok(self
            .query_notes(&sql, Some(id.as_str()))
            .await?
            .into_iter()
            .next())
    }

    async fn get_all(&self) -> Result<Vec<MeetingNote>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM meeting_notes ORDER BY created_at DESC");
        self.query_notes(&sql, None).await
    }

    async fn get_pending(&self) -> Result<Vec<MeetingNote>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM meeting_notes WHERE pending = 1 ORDER BY created_at ASC"
        );
        self.query_notes(&sql, None).await
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute("DELETE FROM meeting_notes WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }

    async fn mark_synced(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE meeting_notes SET pending = 0 WHERE id = ?",
                [id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn replace(&self, local_id: &RecordId, synced: &MeetingNote) -> Result<bool> {
        let tx = self.conn.transaction().await?;
        let removed = tx
            .execute("DELETE FROM meeting_notes WHERE id = ?", [local_id.as_str()])
            .await?;
        if removed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        Self::insert(&tx, synced).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn ids_with_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<RecordId>> {
        query_ids_with_prefix(self.conn, "meeting_notes", prefix, limit).await
    }
}
