//! Local record store for Lily

mod connection;
mod expense_store;
mod meeting_note_store;
mod migrations;
mod store;
mod sync_lease;

pub use connection::Database;
pub use expense_store::LibSqlExpenseStore;
pub use meeting_note_store::LibSqlMeetingNoteStore;
pub use store::RecordStore;
pub use sync_lease::LibSqlSyncLease;
