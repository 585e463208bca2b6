//! lily-core - Core library for Lily
//!
//! This crate contains the shared models, local record store, remote API
//! client, sync engine and background jobs used by every Lily host.

pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod remote;
pub mod services;
pub mod session;
pub mod sync;
pub mod util;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{Amount, Category, Expense, MeetingNote, NewExpense, NewMeetingNote, RecordId};
pub use remote::{HttpRemoteService, RemoteError, RemoteService};
pub use services::DatabaseService;
pub use session::{AuthTokens, SessionContext};
pub use sync::{SweepOutcome, SweepReport, SyncEngine};
