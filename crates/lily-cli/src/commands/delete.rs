use std::path::Path;

use crate::commands::common::{open_client, resolve_expense_id};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path, profile: Option<&str>) -> Result<(), CliError> {
    let client = open_client(db_path, profile).await?;
    let id = resolve_expense_id(&client.engine, id).await?;

    client.engine.delete_expense(&id).await?;
    println!("{id}");
    Ok(())
}
