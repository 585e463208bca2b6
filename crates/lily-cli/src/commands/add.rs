use std::path::Path;

use chrono::{Local, NaiveDate};
use lily_core::models::{Amount, Category, NewExpense};

use crate::commands::common::{format_expense_lines, open_client};
use crate::error::CliError;

pub async fn run_add(
    amount: Amount,
    category: Category,
    note: Option<String>,
    date: Option<NaiveDate>,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    let expense_date = date.unwrap_or_else(|| Local::now().date_naive());
    let payload = NewExpense::new(amount, category, note, expense_date);

    let expense = client.engine.create_expense(payload).await?;
    if expense.pending {
        eprintln!("Server unreachable; expense saved locally and will sync later.");
    }
    for line in format_expense_lines(std::slice::from_ref(&expense)) {
        println!("{line}");
    }
    Ok(())
}
