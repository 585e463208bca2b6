//! Local record store contract and shared column codecs

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::RecordId;

/// Keyed local persistence for one record type (async)
///
/// Writes are insert-or-replace by id; at most one row exists per id.
#[allow(async_fn_in_trait)]
pub trait RecordStore<T> {
    /// Insert a record, replacing any row with the same id
    async fn upsert(&self, record: &T) -> Result<()>;

    /// Upsert many records in one transaction
    async fn upsert_all(&self, records: &[T]) -> Result<()>;

    /// Fetch one record by id
    async fn get(&self, id: &RecordId) -> Result<Option<T>>;

    /// Snapshot of every record, newest first
    async fn get_all(&self) -> Result<Vec<T>>;

    /// Records not yet acknowledged by the server, oldest first
    async fn get_pending(&self) -> Result<Vec<T>>;

    /// Remove a record; absent ids are a no-op
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Clear the pending flag of a record
    async fn mark_synced(&self, id: &RecordId) -> Result<()>;

    /// Swap a pending local row for its server copy in one transaction.
    ///
    /// Returns `false` and writes nothing when the local row is already gone.
    async fn replace(&self, local_id: &RecordId, synced: &T) -> Result<bool>;

    /// Ids starting with `prefix`, at most `limit` of them
    async fn ids_with_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<RecordId>>;
}

/// Ids matching a prefix in `table`, compared on the leading characters so
/// `%` and `_` in the input stay literal
pub(crate) async fn query_ids_with_prefix(
    conn: &Connection,
    table: &str,
    prefix: &str,
    limit: u32,
) -> Result<Vec<RecordId>> {
    let sql = format!(
        "SELECT id FROM {table} WHERE substr(id, 1, length(?)) = ? ORDER BY id LIMIT ?"
    );
    let mut rows = conn.query(&sql, params![prefix, prefix, i64::from(limit)]).await?;

    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(decode_id(row.get(0)?)?);
    }
    Ok(ids)
}

/// Fixed-width UTC timestamps so text ordering matches time ordering
pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| Error::LocalStorage(format!("corrupt timestamp '{raw}': {error}")))
}

pub(crate) fn encode_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|error| Error::LocalStorage(format!("corrupt date '{raw}': {error}")))
}

pub(crate) fn decode_id(raw: String) -> Result<RecordId> {
    RecordId::new(raw).map_err(|_| Error::LocalStorage("row with empty id".into()))
}
