//! Shared database service wrapper used by the sync engine and hosts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlExpenseStore, LibSqlMeetingNoteStore, LibSqlSyncLease, RecordStore,
};
use crate::models::{Expense, MeetingNote, RecordId, TranscriptionStatus};
use crate::Result;

/// Thread-safe service for local record store operations.
///
/// All mutation of the local tables goes through here; the mutex gives
/// single-writer-at-a-time semantics.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::info!("Using local record store at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Insert or replace an expense.
    pub async fn upsert_expense(&self, expense: &Expense) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection())
            .upsert(expense)
            .await
    }

    /// Insert or replace many expenses at once.
    pub async fn upsert_expenses(&self, expenses: &[Expense]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection())
            .upsert_all(expenses)
            .await
    }

    /// Fetch an expense by id.
    pub async fn get_expense(&self, id: &RecordId) -> Result<Option<Expense>> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection()).get(id).await
    }

    /// All cached expenses, newest expense date first.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection()).get_all().await
    }

    /// Expenses not yet acknowledged by the server.
    pub async fn pending_expenses(&self) -> Result<Vec<Expense>> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection())
            .get_pending()
            .await
    }

    /// Remove an expense row.
    pub async fn delete_expense(&self, id: &RecordId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection()).delete(id).await
    }

    /// Expense ids starting with `prefix`.
    pub async fn expense_ids_with_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<RecordId>> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection())
            .ids_with_prefix(prefix, limit)
            .await
    }

    /// Swap a pending local expense for its server copy; `false` if it is gone.
    pub async fn replace_expense(&self, local_id: &RecordId, synced: &Expense) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlExpenseStore::new(db.connection())
            .replace(local_id, synced)
            .await
    }

    /// Insert or replace a meeting note.
    pub async fn upsert_meeting_note(&self, note: &MeetingNote) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .upsert(note)
            .await
    }

    /// Insert or replace many meeting notes at once.
    pub async fn upsert_meeting_notes(&self, notes: &[MeetingNote]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .upsert_all(notes)
            .await
    }

    /// Fetch a meeting note by id.
    pub async fn get_meeting_note(&self, id: &RecordId) -> Result<Option<MeetingNote>> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection()).get(id).await
    }

    /// All cached meeting notes, newest first.
    pub async fn list_meeting_notes(&self) -> Result<Vec<MeetingNote>> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .get_all()
            .await
    }

    /// Meeting notes not yet acknowledged by the server.
    pub async fn pending_meeting_notes(&self) -> Result<Vec<MeetingNote>> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .get_pending()
            .await
    }

    /// Meeting notes whose recording is still local-only.
    pub async fn pending_uploads(&self) -> Result<Vec<MeetingNote>> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .pending_uploads()
            .await
    }

    /// Remove a meeting note row.
    pub async fn delete_meeting_note(&self, id: &RecordId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .delete(id)
            .await
    }

    /// Meeting note ids starting with `prefix`.
    pub async fn meeting_note_ids_with_prefix(
        &self,
        prefix: &str,
        limit: u32,
    ) -> Result<Vec<RecordId>> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .ids_with_prefix(prefix, limit)
            .await
    }

    /// Swap a pending local meeting note for its server copy.
    ///
    /// `false` when the note was deleted while its create was in flight.
    pub async fn replace_meeting_note(
        &self,
        local_id: &RecordId,
        synced: &MeetingNote,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .replace(local_id, synced)
            .await
    }

    /// Record that a meeting's audio reached the server.
    pub async fn mark_audio_uploaded(&self, id: &RecordId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .mark_uploaded(id)
            .await
    }

    /// Claim the sweep lease for this database file.
    pub async fn try_acquire_sweep_lease(
        &self,
        holder: &str,
        stale_after: Duration,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlSyncLease::new(db.connection())
            .try_acquire(holder, stale_after)
            .await
    }

    /// Release a sweep lease taken with [`Self::try_acquire_sweep_lease`].
    pub async fn release_sweep_lease(&self, holder: &str) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncLease::new(db.connection()).release(holder).await
    }

    /// Persist a transcription result.
    pub async fn update_transcription(
        &self,
        id: &RecordId,
        text: Option<&str>,
        status: TranscriptionStatus,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMeetingNoteStore::new(db.connection())
            .update_transcription(id, text, status)
            .await
    }
}
