use std::path::Path;

use chrono::NaiveDate;
use lily_core::models::{DailyStatus, ExpenseSummary, SummaryPeriod};

use crate::commands::common::open_client;
use crate::error::CliError;

pub async fn run_summary(
    period: SummaryPeriod,
    date: Option<NaiveDate>,
    as_json: bool,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    client.require_sign_in()?;

    let summary = client.engine.summary(period, date).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(period, &summary) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_status(db_path: &Path, profile: Option<&str>) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    client.require_sign_in()?;

    let status = client.engine.daily_status().await?;
    println!("{}", describe_status(&status));
    Ok(())
}

pub async fn run_submit(
    date: Option<NaiveDate>,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    client.require_sign_in()?;

    let status = client.engine.submit_day(date).await?;
    println!("{}", describe_status(&status));
    Ok(())
}

pub fn format_summary_lines(period: SummaryPeriod, summary: &ExpenseSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "{} total: {} across {} expense(s)",
        capitalize(period.as_str()),
        summary.total,
        summary.count
    )];
    for category in &summary.by_category {
        lines.push(format!(
            "  {:<13}  {:>10}  ({})",
            category.category,
            category.total.to_string(),
            category.count
        ));
    }
    lines
}

pub fn describe_status(status: &DailyStatus) -> String {
    if status.submitted {
        format!("Expenses for {} are submitted", status.date)
    } else {
        format!("Expenses for {} are not submitted yet", status.date)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
