use std::path::Path;

use lily_core::{SweepOutcome, SweepReport};

use crate::commands::common::open_client;
use crate::error::CliError;

pub async fn run_sync(db_path: &Path, profile: Option<&str>) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    client.require_sign_in()?;

    let outcome = client.engine.sync_pending().await?;
    println!("{}", describe_sweep(outcome));
    Ok(())
}

pub fn describe_sweep(outcome: SweepOutcome) -> String {
    match outcome {
        SweepOutcome::Skipped => "Another sync is already running".to_string(),
        SweepOutcome::Completed(SweepReport { attempted: 0, .. }) => {
            "Nothing to sync".to_string()
        }
        SweepOutcome::Completed(report) => {
            let discarded = if report.discarded > 0 {
                format!("; {} deleted during sync", report.discarded)
            } else {
                String::new()
            };
            format!(
                "Synced {} of {} pending record(s); {} still pending{discarded}",
                report.synced, report.attempted, report.still_pending
            )
        }
    }
}
