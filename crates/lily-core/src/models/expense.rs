//! Expense model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Amount, RecordId, SyncRecord};
use crate::error::Error;
use crate::util::{normalize_text_option, now_millis};

/// Spending category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Entertainment,
    Travel,
    Bills,
    Shopping,
    Other,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Self; 6] = [
        Self::Food,
        Self::Entertainment,
        Self::Travel,
        Self::Bills,
        Self::Shopping,
        Self::Other,
    ];

    /// Lowercase wire/storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Entertainment => "entertainment",
            Self::Travel => "travel",
            Self::Bills => "bills",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| Error::InvalidInput(format!("invalid category: '{s}'")))
    }
}

/// Payload of an expense as sent to the remote create endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Amount,
    pub category: Category,
    pub note: Option<String>,
    pub expense_date: NaiveDate,
}

impl NewExpense {
    /// Build a payload; blank notes are dropped
    #[must_use]
    pub fn new(
        amount: Amount,
        category: Category,
        note: Option<String>,
        expense_date: NaiveDate,
    ) -> Self {
        Self {
            amount,
            category,
            note: normalize_text_option(note),
            expense_date,
        }
    }

    /// Reject amounts the add-expense form would refuse
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount.is_negative() {
            return Err(Error::InvalidInput(format!(
                "amount must not be negative (got {})",
                self.amount
            )));
        }
        Ok(())
    }
}

/// An expense row, either acknowledged by the server or pending locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    /// Owner as reported by the server; empty for offline rows
    pub user_id: String,
    pub amount: Amount,
    pub category: Category,
    pub note: Option<String>,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True until the server has acknowledged this exact record
    pub pending: bool,
}

impl Expense {
    /// Build the local-first copy of a payload that could not reach the server
    #[must_use]
    pub fn offline(payload: &NewExpense) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::local(),
            user_id: String::new(),
            amount: payload.amount,
            category: payload.category,
            note: payload.note.clone(),
            expense_date: payload.expense_date,
            created_at: now,
            updated_at: now,
            pending: true,
        }
    }

    /// The create payload that reproduces this record remotely
    #[must_use]
    pub fn payload(&self) -> NewExpense {
        NewExpense {
            amount: self.amount,
            category: self.category,
            note: self.note.clone(),
            expense_date: self.expense_date,
        }
    }
}

impl SyncRecord for Expense {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Server-side filters for listing expenses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub per_page: u32,
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            category: None,
            per_page: 50,
        }
    }
}

impl ExpenseFilter {
    /// Reject inverted date ranges and empty pages
    pub fn validate(&self) -> Result<(), Error> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidInput(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        if self.per_page == 0 {
            return Err(Error::InvalidInput("per_page must be at least 1".into()));
        }
        Ok(())
    }

    /// Query pairs for the remote list endpoint
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        pairs.push(("per_page", self.per_page.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        raw.parse().unwrap()
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!("Food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" BILLS ".parse::<Category>().unwrap(), Category::Bills);
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Entertainment).unwrap();
        assert_eq!(json, "\"entertainment\"");
    }

    #[test]
    fn new_expense_drops_blank_note() {
        let payload = NewExpense::new(
            Amount::from_cents(100),
            Category::Other,
            Some("   ".to_string()),
            date("2024-03-01"),
        );
        assert_eq!(payload.note, None);
    }

    #[test]
    fn negative_amount_fails_validation() {
        let payload = NewExpense::new(
            Amount::from_cents(-1),
            Category::Food,
            None,
            date("2024-03-01"),
        );
        assert!(matches!(payload.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn offline_expense_is_pending_with_local_id() {
        let payload = NewExpense::new(
            "42.50".parse().unwrap(),
            Category::Food,
            None,
            date("2024-03-01"),
        );
        let expense = Expense::offline(&payload);

        assert!(expense.pending);
        assert!(expense.id.is_uuid());
        assert!(expense.user_id.is_empty());
        assert_eq!(expense.created_at, expense.updated_at);
        assert_eq!(expense.payload(), payload);
    }

    #[test]
    fn filter_rejects_inverted_range() {
        let filter = ExpenseFilter {
            start_date: Some(date("2024-03-02")),
            end_date: Some(date("2024-03-01")),
            ..ExpenseFilter::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn filter_query_pairs_always_include_page_size() {
        let filter = ExpenseFilter {
            category: Some(Category::Travel),
            ..ExpenseFilter::default()
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("category", "travel".to_string()),
                ("per_page", "50".to_string())
            ]
        );
    }
}
