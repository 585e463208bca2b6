use std::path::Path;

use lily_core::models::NewMeetingNote;

use crate::cli::MeetingCommands;
use crate::commands::common::{
    format_meeting_detail, format_meeting_lines, open_client, resolve_meeting_note_id,
};
use crate::error::CliError;

pub async fn run_meeting(
    command: MeetingCommands,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    match command {
        MeetingCommands::Add {
            title,
            duration,
            audio,
        } => {
            let payload = NewMeetingNote::new(title, duration, audio)?;
            let client = open_client(db_path, profile).await?;
            let note = client.engine.create_meeting_note(payload).await?;
            if note.pending {
                eprintln!("Server unreachable; meeting note saved locally and will sync later.");
            }
            println!("{}", note.id);
        }
        MeetingCommands::List { json } => {
            let client = open_client(db_path, profile).await?;
            let notes = client.engine.list_meeting_notes().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&notes)?);
            } else if notes.is_empty() {
                println!("No meeting notes.");
            } else {
                for line in format_meeting_lines(&notes) {
                    println!("{line}");
                }
            }
        }
        MeetingCommands::Show { id, json } => {
            let client = open_client(db_path, profile).await?;
            let id = resolve_meeting_note_id(&client.engine, &id).await?;
            let note = client.engine.get_meeting_note(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&note)?);
            } else {
                for line in format_meeting_detail(&note) {
                    println!("{line}");
                }
            }
        }
        MeetingCommands::Delete { id } => {
            let client = open_client(db_path, profile).await?;
            let id = resolve_meeting_note_id(&client.engine, &id).await?;
            client.engine.delete_meeting_note(&id).await?;
            println!("{id}");
        }
        MeetingCommands::Transcription { id } => {
            let client = open_client(db_path, profile).await?;
            let id = resolve_meeting_note_id(&client.engine, &id).await?;
            let note = client.engine.check_transcription(&id).await?;
            println!("Transcription: {}", note.transcription_status);
            if let Some(text) = note.transcript_text.as_deref() {
                println!();
                println!("{text}");
            }
        }
    }
    Ok(())
}
