//! JSON payloads exchanged with the remote API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RemoteError;
use crate::models::{Amount, Category, Expense, MeetingNote, RecordId, TranscriptionStatus};

#[derive(Debug, Deserialize)]
pub(super) struct ExpenseResponse {
    id: String,
    #[serde(default)]
    user_id: String,
    amount: Amount,
    category: String,
    note: Option<String>,
    expense_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseResponse> for Expense {
    type Error = RemoteError;

    fn try_from(value: ExpenseResponse) -> Result<Self, Self::Error> {
        let category = value.category.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Server returned unknown category '{}' for expense {}",
                value.category,
                value.id
            );
            Category::Other
        });

        Ok(Self {
            id: server_id(value.id)?,
            user_id: value.user_id,
            amount: value.amount,
            category,
            note: value.note,
            expense_date: value.expense_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
            pending: false,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MeetingNoteResponse {
    id: String,
    #[serde(default)]
    user_id: String,
    meeting_title: String,
    audio_file_url: Option<String>,
    transcript_text: Option<String>,
    #[serde(default)]
    duration_secs: i32,
    #[serde(default)]
    transcription_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MeetingNoteResponse> for MeetingNote {
    type Error = RemoteError;

    fn try_from(value: MeetingNoteResponse) -> Result<Self, Self::Error> {
        let audio_uploaded = value.audio_file_url.is_some();
        Ok(Self {
            id: server_id(value.id)?,
            user_id: value.user_id,
            meeting_title: value.meeting_title,
            audio_file_url: value.audio_file_url,
            local_audio_path: None,
            transcript_text: value.transcript_text,
            duration_secs: value.duration_secs,
            transcription_status: TranscriptionStatus::from_str_lossy(&value.transcription_status),
            created_at: value.created_at,
            updated_at: value.updated_at,
            pending: false,
            audio_uploaded,
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitDayRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

fn server_id(raw: String) -> Result<RecordId, RemoteError> {
    RecordId::new(raw)
        .map_err(|_| RemoteError::Unavailable("server returned a record without an id".into()))
}

pub(super) fn convert_all<W, T>(items: Vec<W>) -> Result<Vec<T>, RemoteError>
where
    T: TryFrom<W, Error = RemoteError>,
{
    items.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_response_maps_to_synced_record() {
        let payload = r#"{
            "id": "0b9c7c5e-0000-4000-8000-000000000001",
            "user_id": "u-1",
            "amount": "42.50",
            "category": "food",
            "note": null,
            "expense_date": "2024-03-01",
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-01T12:00:00Z"
        }"#;
        let response: ExpenseResponse = serde_json::from_str(payload).unwrap();
        let expense = Expense::try_from(response).unwrap();
        assert!(!expense.pending);
        assert_eq!(expense.amount, Amount::from_cents(4250));
        assert_eq!(expense.category, Category::Food);
    }

    #[test]
    fn empty_server_id_is_unusable() {
        let payload = r#"{
            "id": "",
            "amount": 1,
            "category": "food",
            "note": null,
            "expense_date": "2024-03-01",
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-01T12:00:00Z"
        }"#;
        let response: ExpenseResponse = serde_json::from_str(payload).unwrap();
        assert!(matches!(
            Expense::try_from(response),
            Err(RemoteError::Unavailable(_))
        ));
    }

    #[test]
    fn meeting_note_response_tracks_upload_state() {
        let payload = r#"{
            "id": "m-1",
            "user_id": "u-1",
            "meeting_title": "Sprint review",
            "audio_file_url": "https://cdn.example.com/m-1.m4a",
            "transcript_text": null,
            "duration_secs": 1800,
            "transcription_status": "processing",
            "created_at": "2024-03-01T12:00:00Z",
            "updated_at": "2024-03-01T12:05:00Z"
        }"#;
        let response: MeetingNoteResponse = serde_json::from_str(payload).unwrap();
        let note = MeetingNote::try_from(response).unwrap();
        assert!(note.audio_uploaded);
        assert!(!note.pending);
        assert_eq!(note.transcription_status, TranscriptionStatus::Processing);
    }
}
