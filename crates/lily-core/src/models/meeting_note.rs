//! Meeting note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RecordId, SyncRecord};
use crate::error::Error;
use crate::util::{normalize_text_option, now_millis};

/// Title given to meetings recorded without one
pub const UNTITLED_MEETING: &str = "Untitled Meeting";

/// Server-side transcription progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a stored or wire value; unknown values read as `Pending`
    #[must_use]
    pub fn from_str_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processing" | "in_progress" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for creating a meeting note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeetingNote {
    pub meeting_title: Option<String>,
    pub duration_secs: i32,
    /// Where the recording lives on this device; never sent to the server
    #[serde(skip)]
    pub local_audio_path: Option<String>,
}

impl NewMeetingNote {
    pub fn new(
        meeting_title: Option<String>,
        duration_secs: i32,
        local_audio_path: Option<String>,
    ) -> Result<Self, Error> {
        if duration_secs < 0 {
            return Err(Error::InvalidInput(format!(
                "meeting duration must not be negative (got {duration_secs})"
            )));
        }
        Ok(Self {
            meeting_title: normalize_text_option(meeting_title),
            duration_secs,
            local_audio_path: normalize_text_option(local_audio_path),
        })
    }
}

/// A recorded meeting and its transcription state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingNote {
    pub id: RecordId,
    pub user_id: String,
    pub meeting_title: String,
    pub audio_file_url: Option<String>,
    pub local_audio_path: Option<String>,
    pub transcript_text: Option<String>,
    pub duration_secs: i32,
    pub transcription_status: TranscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True until the server has acknowledged this note
    pub pending: bool,
    /// Whether the local recording has reached the server
    pub audio_uploaded: bool,
}

impl MeetingNote {
    /// Local-first copy of a note created while the server was unreachable
    #[must_use]
    pub fn offline(payload: &NewMeetingNote) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::local(),
            user_id: String::new(),
            meeting_title: payload
                .meeting_title
                .clone()
                .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
            audio_file_url: None,
            local_audio_path: payload.local_audio_path.clone(),
            transcript_text: None,
            duration_secs: payload.duration_secs,
            transcription_status: TranscriptionStatus::Pending,
            created_at: now,
            updated_at: now,
            pending: true,
            audio_uploaded: false,
        }
    }

    /// The create payload that reproduces this note remotely
    #[must_use]
    pub fn payload(&self) -> NewMeetingNote {
        NewMeetingNote {
            meeting_title: Some(self.meeting_title.clone()),
            duration_secs: self.duration_secs,
            local_audio_path: self.local_audio_path.clone(),
        }
    }

    /// Audio reference to show: the uploaded URL, else the on-device path
    #[must_use]
    pub fn audio_reference(&self) -> Option<&str> {
        self.audio_file_url
            .as_deref()
            .or(self.local_audio_path.as_deref())
    }
}

impl SyncRecord for MeetingNote {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_duration_is_rejected() {
        assert!(NewMeetingNote::new(None, -1, None).is_err());
    }

    #[test]
    fn offline_note_defaults_title() {
        let payload = NewMeetingNote::new(Some("  ".to_string()), 90, None).unwrap();
        let note = MeetingNote::offline(&payload);
        assert_eq!(note.meeting_title, UNTITLED_MEETING);
        assert!(note.pending);
        assert!(!note.audio_uploaded);
        assert_eq!(note.transcription_status, TranscriptionStatus::Pending);
    }

    #[test]
    fn local_audio_path_is_not_serialized() {
        let payload =
            NewMeetingNote::new(Some("Standup".to_string()), 60, Some("/tmp/a.m4a".into()))
                .unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("local_audio_path").is_none());
        assert_eq!(json["meeting_title"], "Standup");
    }

    #[test]
    fn unknown_status_reads_as_pending() {
        assert_eq!(
            TranscriptionStatus::from_str_lossy("COMPLETED"),
            TranscriptionStatus::Completed
        );
        assert_eq!(
            TranscriptionStatus::from_str_lossy("queued"),
            TranscriptionStatus::Pending
        );
    }

    #[test]
    fn audio_reference_prefers_uploaded_url() {
        let payload = NewMeetingNote::new(None, 10, Some("/tmp/a.m4a".into())).unwrap();
        let mut note = MeetingNote::offline(&payload);
        assert_eq!(note.audio_reference(), Some("/tmp/a.m4a"));
        note.audio_file_url = Some("https://cdn.example.com/a.m4a".into());
        assert_eq!(note.audio_reference(), Some("https://cdn.example.com/a.m4a"));
    }
}
