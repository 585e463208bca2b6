use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lily_core::models::{Expense, MeetingNote, RecordId, SyncRecord};
use lily_core::{
    ClientConfig, DatabaseService, HttpRemoteService, SessionContext, SyncEngine,
};

use crate::auth::resolve_tokens;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub type Engine = SyncEngine<HttpRemoteService>;

/// Everything a command needs to talk to the local store and the API
pub struct ClientContext {
    pub profile_name: String,
    pub config: ClientConfig,
    pub session: Arc<SessionContext>,
    pub engine: Engine,
}

impl ClientContext {
    pub fn require_sign_in(&self) -> Result<(), CliError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn(self.profile_name.clone()))
        }
    }
}

pub async fn open_client(db_path: &Path, profile: Option<&str>) -> Result<ClientContext, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(profile);
    let config = profiles.client_config(&profile_name)?;

    let session = Arc::new(match resolve_tokens(&profile_name)? {
        Some(tokens) => SessionContext::with_tokens(tokens),
        None => {
            tracing::warn!(
                "Profile '{profile_name}' has no access token; requests will be rejected by the server"
            );
            SessionContext::new()
        }
    });

    let remote = HttpRemoteService::new(
        config.api_base_url.clone(),
        config.request_timeout(),
        Arc::clone(&session),
    )?;
    let db = DatabaseService::open_path(db_path).await?;

    Ok(ClientContext {
        profile_name,
        config,
        session,
        engine: SyncEngine::new(db, remote),
    })
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LILY_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lily")
        .join("lily.db")
}

pub fn parse_record_id(id: &str) -> Result<RecordId, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyRecordId);
    }
    Ok(RecordId::new(trimmed)?)
}

pub fn short_id(id: &RecordId) -> String {
    id.as_str().chars().take(8).collect()
}

/// Candidates fetched per lookup; enough to show why a prefix is ambiguous
const PREFIX_CANDIDATES: u32 = 10;

pub async fn resolve_expense_id(engine: &Engine, raw: &str) -> Result<RecordId, CliError> {
    let query = parse_record_id(raw)?;
    let candidates = engine
        .database()
        .expense_ids_with_prefix(query.as_str(), PREFIX_CANDIDATES)
        .await?;
    pick_record_id(&query, candidates)
}

pub async fn resolve_meeting_note_id(engine: &Engine, raw: &str) -> Result<RecordId, CliError> {
    let query = parse_record_id(raw)?;
    let candidates = engine
        .database()
        .meeting_note_ids_with_prefix(query.as_str(), PREFIX_CANDIDATES)
        .await?;
    pick_record_id(&query, candidates)
}

/// Choose the record a full id or short-id prefix refers to.
///
/// An exact match wins over longer ids sharing the prefix.
pub fn pick_record_id(query: &RecordId, candidates: Vec<RecordId>) -> Result<RecordId, CliError> {
    if candidates.contains(query) {
        return Ok(query.clone());
    }

    let mut candidates = candidates;
    match candidates.len() {
        0 => Err(CliError::RecordNotFound(query.to_string())),
        1 => Ok(candidates.remove(0)),
        _ => {
            let listed = candidates
                .iter()
                .map(RecordId::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousRecordId(format!("'{query}' matches {listed}")))
        }
    }
}

pub fn pending_marker(record: &impl SyncRecord) -> &'static str {
    if record.is_pending() {
        "  [pending]"
    } else {
        ""
    }
}

pub fn format_expense_lines(expenses: &[Expense]) -> Vec<String> {
    expenses
        .iter()
        .map(|expense| {
            let note = expense.note.as_deref().unwrap_or("");
            format!(
                "{:<8}  {}  {:>10}  {:<13}  {}{}",
                short_id(&expense.id),
                expense.expense_date,
                expense.amount.to_string(),
                expense.category.as_str(),
                note,
                pending_marker(expense)
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn format_meeting_lines(notes: &[MeetingNote]) -> Vec<String> {
    let now = Utc::now();
    notes
        .iter()
        .map(|note| {
            format!(
                "{:<8}  {:<32}  {:>8}  {:<10}  {}{}",
                short_id(&note.id),
                truncate(&note.meeting_title, 32),
                format_duration(note.duration_secs),
                note.transcription_status.as_str(),
                format_relative_time(note.created_at, now),
                pending_marker(note)
            )
        })
        .collect()
}

pub fn format_meeting_detail(note: &MeetingNote) -> Vec<String> {
    let mut lines = vec![
        format!("ID:          {}", note.id),
        format!("Title:       {}", note.meeting_title),
        format!("Duration:    {}", format_duration(note.duration_secs)),
        format!("Status:      {}", note.transcription_status),
        format!(
            "Created:     {}",
            note.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    ];
    if let Some(audio) = note.audio_reference() {
        lines.push(format!("Audio:       {audio}"));
    }
    if note.pending {
        lines.push("Sync:        pending".to_string());
    }
    if let Some(transcript) = note.transcript_text.as_deref() {
        lines.push(String::new());
        lines.push(transcript.to_string());
    }
    lines
}

pub fn format_duration(secs: i32) -> String {
    let secs = secs.max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - timestamp).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
