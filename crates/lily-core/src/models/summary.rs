//! Analytics and daily check-in models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Amount;
use crate::error::Error;

/// Aggregation window for spending summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl SummaryPeriod {
    /// Path segment under `analytics/`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for SummaryPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(Error::InvalidInput(format!("invalid summary period: '{s}'"))),
        }
    }
}

/// Spending total for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Amount,
    pub count: i64,
}

/// Spending totals for a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total: Amount,
    pub count: i64,
    #[serde(default)]
    pub by_category: Vec<CategorySummary>,
}

/// Whether the user has closed out their expenses for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatus {
    pub submitted: bool,
    pub date: NaiveDate,
}
