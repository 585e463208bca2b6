use std::path::Path;

use chrono::NaiveDate;
use lily_core::models::{Category, ExpenseFilter};
use serde::Serialize;

use crate::commands::common::{format_expense_lines, format_meeting_lines, open_client};
use crate::error::CliError;

pub struct ListOptions {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<Category>,
    pub limit: u32,
    pub json: bool,
}

impl ListOptions {
    pub const fn filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            start_date: self.from,
            end_date: self.to,
            category: self.category,
            per_page: self.limit,
        }
    }
}

pub async fn run_list(
    options: ListOptions,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    let expenses = client.engine.list_expenses(&options.filter()).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&expenses)?);
    } else if expenses.is_empty() {
        println!("No expenses.");
    } else {
        for line in format_expense_lines(&expenses) {
            println!("{line}");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PendingItems<'a> {
    expenses: &'a [lily_core::Expense],
    meeting_notes: &'a [lily_core::MeetingNote],
}

pub async fn run_pending(
    as_json: bool,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    let db = client.engine.database();
    let expenses = db.pending_expenses().await?;
    let meeting_notes = db.pending_meeting_notes().await?;

    if as_json {
        let items = PendingItems {
            expenses: &expenses,
            meeting_notes: &meeting_notes,
        };
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if expenses.is_empty() && meeting_notes.is_empty() {
        println!("Nothing waiting to sync.");
        return Ok(());
    }
    for line in format_expense_lines(&expenses) {
        println!("{line}");
    }
    for line in format_meeting_lines(&meeting_notes) {
        println!("{line}");
    }
    Ok(())
}
