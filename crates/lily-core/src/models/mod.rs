//! Data models for Lily

mod amount;
mod expense;
mod meeting_note;
mod record_id;
mod summary;

pub use amount::Amount;
pub use expense::{Category, Expense, ExpenseFilter, NewExpense};
pub use meeting_note::{MeetingNote, NewMeetingNote, TranscriptionStatus, UNTITLED_MEETING};
pub use record_id::RecordId;
pub use summary::{CategorySummary, DailyStatus, ExpenseSummary, SummaryPeriod};

/// A record kept in the local store with a pending flag
pub trait SyncRecord {
    /// Current identifier (local or server-assigned)
    fn id(&self) -> &RecordId;

    /// Whether the server has not yet acknowledged the record
    fn is_pending(&self) -> bool;
}
