//! Local-first writes and background reconciliation against the remote API.
//!
//! Every create lands in the local record store before the call returns. When
//! the remote service is unreachable the record is kept under a local id with
//! `pending = true`, and [`SyncEngine::sync_pending`] later swaps it for the
//! server copy.
//!
//! Sweeps are coalesced twice: an in-process guard stops overlapping calls on
//! one engine, and a lease row in the database stops two processes (say
//! `lily sync` and a running daemon) from sweeping the same file at once.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{
    DailyStatus, Expense, ExpenseFilter, ExpenseSummary, MeetingNote, NewExpense, NewMeetingNote,
    RecordId, SummaryPeriod, SyncRecord, TranscriptionStatus,
};
use crate::remote::RemoteService;
use crate::services::DatabaseService;


/// A lease older than this is assumed to belong to a process that died mid-sweep
const SWEEP_LEASE_TTL: Duration = Duration::from_secs(10 * 60);

/// Counters from one reconciliation sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub synced: usize,
    pub still_pending: usize,
    /// Deleted locally while their create was in flight; the server copy is removed again
    pub discarded: usize,
}

/// What happened to one pending record during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordSync {
    Synced,
    StillPending,
    Discarded,
}

impl SweepReport {
    fn record(&mut self, outcome: RecordSync) {
        self.attempted += 1;
        match outcome {
            RecordSync::Synced => self.synced += 1,
            RecordSync::StillPending => self.still_pending += 1,
            RecordSync::Discarded => self.discarded += 1,
        }
    }
}

/// Result of asking for a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep was already in flight; this request was coalesced into it
    Skipped,
}

/// Mediates between the local record store and the remote service
pub struct SyncEngine<R> {
    db: DatabaseService,
    remote: R,
    sweep_guard: Mutex<()>,
    lease_holder: String,
}

impl<R: RemoteService> SyncEngine<R> {
    pub fn new(db: DatabaseService, remote: R) -> Self {
        Self {
            db,
            remote,
            sweep_guard: Mutex::new(()),
            lease_holder: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub const fn database(&self) -> &DatabaseService {
        &self.db
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Create an expense remotely, or keep it locally as pending when offline.
    pub async fn create_expense(&self, payload: NewExpense) -> Result<Expense> {
        payload.validate()?;

        let expense = match self.remote.create_expense(&payload).await {
            Ok(expense) => expense,
            Err(error) if error.is_unavailable() => {
                let expense = Expense::offline(&payload);
                tracing::debug!(
                    "Remote create failed ({error}); stored expense {} as pending",
                    expense.id
                );
                expense
            }
            Err(error) => return Err(error.into()),
        };

        self.db.upsert_expense(&expense).await?;
        Ok(expense)
    }

    /// Server list refreshed into the cache; offline, only pending rows.
    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        filter.validate()?;

        match self.remote.list_expenses(filter).await {
            Ok(expenses) => {
                self.db.upsert_expenses(&expenses).await?;
                Ok(expenses)
            }
            Err(error) if error.is_unavailable() => {
                tracing::debug!("Remote list failed ({error}); returning pending expenses");
                self.db.pending_expenses().await
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Every locally cached expense, synced or not
    pub async fn cached_expenses(&self) -> Result<Vec<Expense>> {
        self.db.list_expenses().await
    }

    pub async fn pending_expenses(&self) -> Result<Vec<Expense>> {
        self.db.pending_expenses().await
    }

    /// Best-effort remote delete followed by an unconditional local delete.
    pub async fn delete_expense(&self, id: &RecordId) -> Result<()> {
        if let Err(error) = self.remote.delete_expense(id).await {
            tracing::warn!("Remote delete of expense {id} failed: {error}");
        }
        self.db.delete_expense(id).await
    }

    pub async fn create_meeting_note(&self, payload: NewMeetingNote) -> Result<MeetingNote> {
        if payload.duration_secs < 0 {
            return Err(Error::InvalidInput(format!(
                "meeting duration must not be negative (got {})",
                payload.duration_secs
            )));
        }

        let note = match self.remote.create_meeting_note(&payload).await {
            Ok(mut note) => {
                note.local_audio_path.clone_from(&payload.local_audio_path);
                note
            }
            Err(error) if error.is_unavailable() => {
                let note = MeetingNote::offline(&payload);
                tracing::debug!(
                    "Remote create failed ({error}); stored meeting note {} as pending",
                    note.id
                );
                note
            }
            Err(error) => return Err(error.into()),
        };

        self.db.upsert_meeting_note(&note).await?;
        Ok(note)
    }

    /// Server list refreshed into the cache; offline, the full local snapshot.
    pub async fn list_meeting_notes(&self) -> Result<Vec<MeetingNote>> {
        match self.remote.list_meeting_notes().await {
            Ok(notes) => {
                let cached: HashMap<RecordId, Option<String>> = self
                    .db
                    .list_meeting_notes()
                    .await?
                    .into_iter()
                    .map(|note| (note.id, note.local_audio_path))
                    .collect();

                let notes: Vec<MeetingNote> = notes
                    .into_iter()
                    .map(|mut note| {
                        if let Some(path) = cached.get(&note.id) {
                            note.local_audio_path.clone_from(path);
                        }
                        note
                    })
                    .collect();
                self.db.upsert_meeting_notes(&notes).await?;
                Ok(notes)
            }
            Err(error) if error.is_unavailable() => {
                tracing::debug!("Remote list failed ({error}); returning cached meeting notes");
                self.db.list_meeting_notes().await
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Remote copy when reachable, otherwise the cached row.
    pub async fn get_meeting_note(&self, id: &RecordId) -> Result<MeetingNote> {
        let cached = self.db.get_meeting_note(id).await?;

        match self.remote.get_meeting_note(id).await {
            Ok(mut note) => {
                if let Some(local) = &cached {
                    note.local_audio_path.clone_from(&local.local_audio_path);
                }
                self.db.upsert_meeting_note(&note).await?;
                Ok(note)
            }
            Err(error) => {
                tracing::debug!("Remote fetch of meeting note {id} failed: {error}");
                cached.ok_or_else(|| Error::NotFound(format!("meeting note {id}")))
            }
        }
    }

    pub async fn delete_meeting_note(&self, id: &RecordId) -> Result<()> {
        if let Err(error) = self.remote.delete_meeting_note(id).await {
            tracing::warn!("Remote delete of meeting note {id} failed: {error}");
        }
        self.db.delete_meeting_note(id).await
    }

    /// Poll transcription progress; a finished transcript is cached locally.
    ///
    /// A server answer carrying an audio URL also marks the recording uploaded.
    pub async fn check_transcription(&self, id: &RecordId) -> Result<MeetingNote> {
        let note = self.remote.check_transcription(id).await?;

        if note.audio_uploaded {
            self.db.mark_audio_uploaded(id).await?;
        }

        if note.transcription_status == TranscriptionStatus::Completed {
            if let Some(text) = note.transcript_text.as_deref() {
                self.db
                    .update_transcription(id, Some(text), TranscriptionStatus::Completed)
                    .await?;
            }
        }
        Ok(note)
    }

    pub async fn pending_uploads(&self) -> Result<Vec<MeetingNote>> {
        self.db.pending_uploads().await
    }

    /// Retry every pending record once.
    ///
    /// Remote failures leave the row pending for the next sweep; only a
    /// local storage failure aborts. A sweep requested while another is
    /// running, in this process or another one, returns
    /// [`SweepOutcome::Skipped`].
    pub async fn sync_pending(&self) -> Result<SweepOutcome> {
        let Ok(_guard) = self.sweep_guard.try_lock() else {
            tracing::debug!("Sweep already in flight; skipping");
            return Ok(SweepOutcome::Skipped);
        };

        if !self
            .db
            .try_acquire_sweep_lease(&self.lease_holder, SWEEP_LEASE_TTL)
            .await?
        {
            tracing::debug!("Another process is sweeping this database; skipping");
            return Ok(SweepOutcome::Skipped);
        }

        let swept = self.sweep().await;
        let released = self.db.release_sweep_lease(&self.lease_holder).await;
        let report = match (swept, released) {
            (Ok(report), Ok(())) => report,
            (Err(error), released) => {
                if let Err(release_error) = released {
                    tracing::warn!("Failed to release sweep lease: {release_error}");
                }
                return Err(error);
            }
            (Ok(_), Err(error)) => return Err(error),
        };

        if report.attempted > 0 {
            tracing::info!(
                "Sync sweep finished: {} attempted, {} synced, {} still pending, {} discarded",
                report.attempted,
                report.synced,
                report.still_pending,
                report.discarded
            );
        }
        Ok(SweepOutcome::Completed(report))
    }

    async fn sweep(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for expense in self.db.pending_expenses().await? {
            let outcome = match self.remote.create_expense(&expense.payload()).await {
                Ok(synced) => {
                    if self.db.replace_expense(&expense.id, &synced).await? {
                        log_synced("Expense", &expense, &synced);
                        RecordSync::Synced
                    } else {
                        log_discarded("Expense", &expense, &synced);
                        if let Err(error) = self.remote.delete_expense(&synced.id).await {
                            tracing::warn!(
                                "Remote delete of expense {} failed: {error}",
                                synced.id
                            );
                        }
                        RecordSync::Discarded
                    }
                }
                Err(error) => {
                    tracing::debug!("Expense {} still pending: {error}", expense.id);
                    RecordSync::StillPending
                }
            };
            report.record(outcome);
        }

        for note in self.db.pending_meeting_notes().await? {
            let outcome = match self.remote.create_meeting_note(&note.payload()).await {
                Ok(mut synced) => {
                    synced.local_audio_path.clone_from(&note.local_audio_path);
                    if self.db.replace_meeting_note(&note.id, &synced).await? {
                        log_synced("Meeting note", &note, &synced);
                        RecordSync::Synced
                    } else {
                        log_discarded("Meeting note", &note, &synced);
                        if let Err(error) = self.remote.delete_meeting_note(&synced.id).await {
                            tracing::warn!(
                                "Remote delete of meeting note {} failed: {error}",
                                synced.id
                            );
                        }
                        RecordSync::Discarded
                    }
                }
                Err(error) => {
                    tracing::debug!("Meeting note {} still pending: {error}", note.id);
                    RecordSync::StillPending
                }
            };
            report.record(outcome);
        }

        Ok(report)
    }

    pub async fn summary(
        &self,
        period: SummaryPeriod,
        date: Option<NaiveDate>,
    ) -> Result<ExpenseSummary> {
        Ok(self.remote.summary(period, date).await?)
    }

    pub async fn daily_status(&self) -> Result<DailyStatus> {
        Ok(self.remote.daily_status().await?)
    }

    pub async fn submit_day(&self, date: Option<NaiveDate>) -> Result<DailyStatus> {
        Ok(self.remote.submit_day(date).await?)
    }
}

fn log_synced<T: SyncRecord>(kind: &str, local: &T, synced: &T) {
    tracing::debug!("{kind} {} synced as {}", local.id(), synced.id());
}

fn log_discarded<T: SyncRecord>(kind: &str, local: &T, synced: &T) {
    tracing::debug!(
        "{kind} {} was deleted during its sync; dropping server copy {}",
        local.id(),
        synced.id()
    );
}
