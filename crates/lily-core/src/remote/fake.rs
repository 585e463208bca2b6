//! Scripted in-process remote used by tests to simulate outages and recovery.

use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;

use super::{RemoteError, RemoteResult, RemoteService};
use crate::models::{
    Amount, DailyStatus, Expense, ExpenseFilter, ExpenseSummary, MeetingNote, NewExpense,
    NewMeetingNote, RecordId, SummaryPeriod, TranscriptionStatus, UNTITLED_MEETING,
};
use crate::util::now_millis;

#[derive(Default)]
struct FakeState {
    offline: bool,
    rejection: Option<(u16, String)>,
    failing_creates: usize,
    create_calls: usize,
    create_delay: Option<Duration>,
    submitted: bool,
    expenses: Vec<Expense>,
    meeting_notes: Vec<MeetingNote>,
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    state: Mutex<FakeState>,
}

impl FakeRemote {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        let remote = Self::default();
        remote.set_offline(true);
        remote
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Every call answers with this 4xx until cleared
    pub fn reject_with(&self, status: u16, message: &str) {
        self.state.lock().unwrap().rejection = Some((status, message.to_string()));
    }

    /// The next `count` create calls fail as unavailable
    pub fn fail_next_creates(&self, count: usize) {
        self.state.lock().unwrap().failing_creates = count;
    }

    pub fn delay_creates(&self, delay: Duration) {
        self.state.lock().unwrap().create_delay = Some(delay);
    }

    pub fn set_submitted(&self, submitted: bool) {
        self.state.lock().unwrap().submitted = submitted;
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn server_expenses(&self) -> Vec<Expense> {
        self.state.lock().unwrap().expenses.clone()
    }

    pub fn server_meeting_notes(&self) -> Vec<MeetingNote> {
        self.state.lock().unwrap().meeting_notes.clone()
    }

    /// Mark a server-side note as transcribed
    pub fn complete_transcription(&self, id: &RecordId, text: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(note) = state.meeting_notes.iter_mut().find(|note| &note.id == id) {
            note.transcript_text = Some(text.to_string());
            note.transcription_status = TranscriptionStatus::Completed;
            note.updated_at = now_millis();
        }
    }

    /// Mark a server-side note's audio as received
    pub fn attach_audio(&self, id: &RecordId, url: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(note) = state.meeting_notes.iter_mut().find(|note| &note.id == id) {
            note.audio_file_url = Some(url.to_string());
            note.audio_uploaded = true;
        }
    }

    fn check(&self) -> RemoteResult<()> {
        let state = self.state.lock().unwrap();
        if let Some((status, message)) = &state.rejection {
            return Err(RemoteError::Rejected {
                status: *status,
                message: message.clone(),
            });
        }
        if state.offline {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn begin_create(&self) -> RemoteResult<()> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.create_calls += 1;
            state.create_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(RemoteError::Unavailable("gateway timeout".to_string()));
        }
        Ok(())
    }
}

fn server_id() -> RecordId {
    RecordId::local()
}

impl RemoteService for FakeRemote {
    async fn create_expense(&self, payload: &NewExpense) -> RemoteResult<Expense> {
        self.begin_create().await?;
        let now = now_millis();
        let expense = Expense {
            id: server_id(),
            user_id: "user-1".to_string(),
            amount: payload.amount,
            category: payload.category,
            note: payload.note.clone(),
            expense_date: payload.expense_date,
            created_at: now,
            updated_at: now,
            pending: false,
        };
        self.state.lock().unwrap().expenses.push(expense.clone());
        Ok(expense)
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> RemoteResult<Vec<Expense>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .expenses
            .iter()
            .filter(|expense| filter.category.is_none_or(|c| c == expense.category))
            .filter(|expense| filter.start_date.is_none_or(|d| expense.expense_date >= d))
            .filter(|expense| filter.end_date.is_none_or(|d| expense.expense_date <= d))
            .take(filter.per_page as usize)
            .cloned()
            .collect())
    }

    async fn delete_expense(&self, id: &RecordId) -> RemoteResult<()> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .expenses
            .retain(|expense| &expense.id != id);
        Ok(())
    }

    async fn summary(
        &self,
        _period: SummaryPeriod,
        _date: Option<NaiveDate>,
    ) -> RemoteResult<ExpenseSummary> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let cents = state.expenses.iter().map(|e| e.amount.cents()).sum();
        Ok(ExpenseSummary {
            total: Amount::from_cents(cents),
            count: i64::try_from(state.expenses.len()).unwrap(),
            by_category: Vec::new(),
        })
    }

    async fn daily_status(&self) -> RemoteResult<DailyStatus> {
        self.check()?;
        Ok(DailyStatus {
            submitted: self.state.lock().unwrap().submitted,
            date: now_millis().date_naive(),
        })
    }

    async fn submit_day(&self, date: Option<NaiveDate>) -> RemoteResult<DailyStatus> {
        self.check()?;
        self.state.lock().unwrap().submitted = true;
        Ok(DailyStatus {
            submitted: true,
            date: date.unwrap_or_else(|| now_millis().date_naive()),
        })
    }

    async fn create_meeting_note(&self, payload: &NewMeetingNote) -> RemoteResult<MeetingNote> {
        self.begin_create().await?;
        let now = now_millis();
        let note = MeetingNote {
            id: server_id(),
            user_id: "user-1".to_string(),
            meeting_title: payload
                .meeting_title
                .clone()
                .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
            audio_file_url: None,
            local_audio_path: None,
            transcript_text: None,
            duration_secs: payload.duration_secs,
            transcription_status: TranscriptionStatus::Pending,
            created_at: now,
            updated_at: now,
            pending: false,
            audio_uploaded: false,
        };
        self.state.lock().unwrap().meeting_notes.push(note.clone());
        Ok(note)
    }

    async fn list_meeting_notes(&self) -> RemoteResult<Vec<MeetingNote>> {
        self.check()?;
        Ok(self.server_meeting_notes())
    }

    async fn get_meeting_note(&self, id: &RecordId) -> RemoteResult<MeetingNote> {
        self.check()?;
        self.server_meeting_notes()
            .into_iter()
            .find(|note| &note.id == id)
            .ok_or_else(|| RemoteError::Rejected {
                status: 404,
                message: "meeting note not found".to_string(),
            })
    }

    async fn delete_meeting_note(&self, id: &RecordId) -> RemoteResult<()> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .meeting_notes
            .retain(|note| &note.id != id);
        Ok(())
    }

    async fn check_transcription(&self, id: &RecordId) -> RemoteResult<MeetingNote> {
        self.get_meeting_note(id).await
    }
}
