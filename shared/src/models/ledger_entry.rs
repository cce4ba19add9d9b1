//! Ledger entry model (the `transactions` table)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Income,
    Expense,
}

/// Immutable accounting record
///
/// Created by purchase intake, replenishment and batch-sale flows; never
/// updated or deleted by the engine once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub amount: f64,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub category_id: i64,
}

/// Create ledger entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryCreate {
    pub amount: f64,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub category_id: i64,
}
