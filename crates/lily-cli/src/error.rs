use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lily_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("No record matches '{0}'")]
    RecordNotFound(String),
    #[error("Record ID is ambiguous: {0}")]
    AmbiguousRecordId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Profile '{0}' is not signed in. Run `lily auth login --token <token>` or set LILY_ACCESS_TOKEN."
    )]
    NotSignedIn(String),
}
