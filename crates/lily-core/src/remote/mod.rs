//! Remote API contract consumed by the sync engine.

mod http;
mod wire;

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    DailyStatus, Expense, ExpenseFilter, ExpenseSummary, MeetingNote, NewExpense, NewMeetingNote,
    RecordId, SummaryPeriod,
};

pub use http::HttpRemoteService;

/// Outcome of a remote call that did not produce a result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Network failure, timeout, 5xx, or a response we could not use
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    /// The server understood and refused the request (4xx)
    #[error("remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl RemoteError {
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// The expense/meeting-note API as seen by the client.
///
/// Records returned from create and list calls always carry a non-empty
/// server-assigned id and have `pending = false`.
pub trait RemoteService: Send + Sync {
    fn create_expense(
        &self,
        payload: &NewExpense,
    ) -> impl Future<Output = RemoteResult<Expense>> + Send;

    fn list_expenses(
        &self,
        filter: &ExpenseFilter,
    ) -> impl Future<Output = RemoteResult<Vec<Expense>>> + Send;

    fn delete_expense(&self, id: &RecordId) -> impl Future<Output = RemoteResult<()>> + Send;

    fn summary(
        &self,
        period: SummaryPeriod,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = RemoteResult<ExpenseSummary>> + Send;

    fn daily_status(&self) -> impl Future<Output = RemoteResult<DailyStatus>> + Send;

    fn submit_day(
        &self,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = RemoteResult<DailyStatus>> + Send;

    fn create_meeting_note(
        &self,
        payload: &NewMeetingNote,
    ) -> impl Future<Output = RemoteResult<MeetingNote>> + Send;

    fn list_meeting_notes(&self) -> impl Future<Output = RemoteResult<Vec<MeetingNote>>> + Send;

    fn get_meeting_note(
        &self,
        id: &RecordId,
    ) -> impl Future<Output = RemoteResult<MeetingNote>> + Send;

    fn delete_meeting_note(&self, id: &RecordId) -> impl Future<Output = RemoteResult<()>> + Send;

    fn check_transcription(
        &self,
        id: &RecordId,
    ) -> impl Future<Output = RemoteResult<MeetingNote>> + Send;
}
