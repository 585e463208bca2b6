use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lily_core::models::{Amount, Category, SummaryPeriod};

#[derive(Parser)]
#[command(name = "lily")]
#[command(about = "Track expenses and meeting notes, online or offline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an expense (kept locally when the server is unreachable)
    #[command(alias = "new")]
    Add {
        /// Amount, e.g. 42.50
        #[arg(allow_hyphen_values = true)]
        amount: Amount,
        /// food, entertainment, travel, bills, shopping or other
        #[arg(short, long)]
        category: Category,
        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
        /// Expense date (YYYY-MM-DD, defaults to today)
        #[arg(short, long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// List expenses from the server (pending ones when offline)
    List {
        /// Earliest expense date
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,
        /// Latest expense date
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,
        /// Only this category
        #[arg(long)]
        category: Option<Category>,
        /// Page size requested from the server
        #[arg(short, long, default_value = "50")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show expenses and meeting notes waiting to be synced
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an expense
    Delete {
        /// Expense ID or a unique prefix of it
        id: String,
    },
    /// Push pending records to the server once
    Sync,
    /// Run the sync and reminder jobs until interrupted
    Daemon,
    /// Spending summary for a period
    Summary {
        /// daily, weekly or monthly
        period: SummaryPeriod,
        /// Reference date within the period
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show whether today's expenses were submitted
    Status,
    /// Mark a day's expenses as submitted
    Submit {
        /// Day to submit (defaults to today on the server)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Manage meeting notes
    Meeting {
        #[command(subcommand)]
        command: MeetingCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the access token for a profile
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
pub enum MeetingCommands {
    /// Record a meeting note
    Add {
        /// Meeting title
        #[arg(short, long)]
        title: Option<String>,
        /// Recording length in seconds
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        duration: i32,
        /// Path of the recording on this device
        #[arg(long, value_name = "PATH")]
        audio: Option<String>,
    },
    /// List meeting notes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one meeting note
    Show {
        /// Meeting note ID or a unique prefix of it
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meeting note
    Delete {
        /// Meeting note ID or a unique prefix of it
        id: String,
    },
    /// Poll transcription progress
    Transcription {
        /// Meeting note ID or a unique prefix of it
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// API base URL (e.g. <https://api.example.com/api>)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// HTTP request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Seconds between background sync sweeps
        #[arg(long, value_name = "SECS")]
        sync_interval_secs: Option<u64>,
        /// Seconds between daily reminder checks
        #[arg(long, value_name = "SECS")]
        reminder_interval_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the effective configuration of a profile
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an access token in the keychain
    Login {
        /// Access token issued by the Lily web login
        #[arg(long, value_name = "TOKEN")]
        token: String,
        /// Optional ID token (sent instead of the access token when present)
        #[arg(long, value_name = "TOKEN")]
        id_token: Option<String>,
    },
    /// Show auth status for profile
    Status,
    /// Remove stored tokens for profile
    Logout,
}
