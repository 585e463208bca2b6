//! Expense store implementation

use libsql::{params, Connection, Row};

use super::store::{
    decode_date, decode_id, decode_timestamp, encode_date, encode_timestamp,
    query_ids_with_prefix, RecordStore,
};
use crate::error::Result;
use crate::models::{Amount, Expense, RecordId};

const EXPENSE_COLUMNS: &str = "id, user_id, amount_cents, category, note, expense_date, created_at, updated_at, pending";

/// libSQL implementation of `RecordStore<Expense>`
pub struct LibSqlExpenseStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlExpenseStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn insert(conn: &Connection, expense: &Expense) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO expenses
                (id, user_id, amount_cents, category, note, expense_date, created_at, updated_at, pending)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                expense.id.as_str(),
                expense.user_id.as_str(),
                expense.amount.cents(),
                expense.category.as_str(),
                expense.note.clone(),
                encode_date(expense.expense_date),
                encode_timestamp(&expense.created_at),
                encode_timestamp(&expense.updated_at),
                i32::from(expense.pending)
            ],
        )
        .await?;
        Ok(())
    }

    /// Parse an expense from a database row
    fn parse_expense(row: &Row) -> Result<Expense> {
        let category: String = row.get(3)?;
        Ok(Expense {
            id: decode_id(row.get(0)?)?,
            user_id: row.get(1)?,
            amount: Amount::from_cents(row.get(2)?),
            category: category.parse().unwrap_or(crate::models::Category::Other),
            note: row.get(4)?,
            expense_date: decode_date(&row.get::<String>(5)?)?,
            created_at: decode_timestamp(&row.get::<String>(6)?)?,
            updated_at: decode_timestamp(&row.get::<String>(7)?)?,
            pending: row.get::<i32>(8)? != 0,
        })
    }

    async fn query_expenses(&self, sql: &str, id: Option<&str>) -> Result<Vec<Expense>> {
        let mut rows = match id {
            Some(id) => self.conn.query(sql, [id]).await?,
            None => self.conn.query(sql, ()).await?,
        };

        let mut expenses = Vec::new();
        while let Some(row) = rows.next().await? {
            expenses.push(Self::parse_expense(&row)?);
        }
        Ok(expenses)
    }
}

impl RecordStore<Expense> for LibSqlExpenseStore<'_> {
    async fn upsert(&self, record: &Expense) -> Result<()> {
        Self::insert(self.conn, record).await
    }

    async fn upsert_all(&self, records: &[Expense]) -> Result<()> {
        let tx = self.conn.transaction().await?;
        for record in records {
            Self::insert(&tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?");
        Ok(self
            .query_expenses(&sql, Some(id.as_str()))
            .await?
            .into_iter()
            .next())
    }

    async fn get_all(&self) -> Result<Vec<Expense>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY expense_date DESC, created_at DESC"
        );
        self.query_expenses(&sql, None).await
    }

    async fn get_pending(&self) -> Result<Vec<Expense>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE pending = 1 ORDER BY created_at ASC"
        );
        self.query_expenses(&sql, None).await
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute("DELETE FROM expenses WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }

    async fn mark_synced(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute("UPDATE expenses SET pending = 0 WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }

    async fn replace(&self, local_id: &RecordId, synced: &Expense) -> Result<bool> {
        let tx = self.conn.transaction().await?;
        let removed = tx
            .execute("DELETE FROM expenses WHERE id = ?", [local_id.as_str()])
            .await?;
        if removed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        Self::insert(&tx, synced).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn ids_with_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<RecordId>> {
        query_ids_with_prefix(self.conn, "expenses", prefix, limit).await
    }
}
