use std::path::Path;
use std::sync::Arc;

use lily_core::jobs::{
    JobScheduler, ReminderJob, ReminderNotifier, ReminderReason, SyncPendingJob, REMINDER_BODY,
    REMINDER_TITLE,
};

use crate::commands::common::open_client;
use crate::error::CliError;

/// Prints the daily reminder to the terminal running the daemon
pub struct TerminalNotifier;

impl ReminderNotifier for TerminalNotifier {
    fn notify(&self, reason: ReminderReason) {
        if reason == ReminderReason::StatusUnknown {
            tracing::debug!("Daily status unavailable; reminding anyway");
        }
        println!("{REMINDER_TITLE}: {REMINDER_BODY}");
    }
}

pub async fn run_daemon(db_path: &Path, profile: Option<&str>) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    client.require_sign_in()?;

    let session = Arc::clone(&client.session);
    let config = client.config;
    let engine = Arc::new(client.engine);

    let mut scheduler = JobScheduler::new(config.retry_policy());
    scheduler.schedule(SyncPendingJob::new(Arc::clone(&engine)), config.sync_interval());
    scheduler.schedule(
        ReminderJob::new(engine, TerminalNotifier),
        config.reminder_interval(),
    );

    println!(
        "Running {} background job(s) for profile '{}'; press Ctrl-C to stop",
        scheduler.job_count(),
        client.profile_name
    );
    tokio::signal::ctrl_c().await?;

    scheduler.shutdown().await;
    session.close();
    println!("Stopped");
    Ok(())
}
