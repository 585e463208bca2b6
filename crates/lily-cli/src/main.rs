//! lily - Command line client for Lily expenses and meeting notes

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::resolve_db_path;
use crate::commands::config::run_config;
use crate::commands::daemon::run_daemon;
use crate::commands::delete::run_delete;
use crate::commands::list::{run_list, run_pending, ListOptions};
use crate::commands::meeting::run_meeting;
use crate::commands::summary::{run_status, run_submit, run_summary};
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lily=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Add {
            amount,
            category,
            note,
            date,
        } => run_add(amount, category, note, date, &db_path, profile).await?,
        Commands::List {
            from,
            to,
            category,
            limit,
            json,
        } => {
            let options = ListOptions {
                from,
                to,
                category,
                limit,
                json,
            };
            run_list(options, &db_path, profile).await?;
        }
        Commands::Pending { json } => run_pending(json, &db_path, profile).await?,
        Commands::Delete { id } => run_delete(&id, &db_path, profile).await?,
        Commands::Sync => run_sync(&db_path, profile).await?,
        Commands::Daemon => run_daemon(&db_path, profile).await?,
        Commands::Summary { period, date, json } => {
            run_summary(period, date, json, &db_path, profile).await?;
        }
        Commands::Status => run_status(&db_path, profile).await?,
        Commands::Submit { date } => run_submit(date, &db_path, profile).await?,
        Commands::Meeting { command } => run_meeting(command, &db_path, profile).await?,
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => run_auth(command, profile)?,
    }

    Ok(())
}
