//! Audit movement models (the `app_movements` table)
//!
//! Append-only business-event log. Writes are best-effort: a failed
//! movement insert must never abort the operation that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Business domain of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementCategory {
    Stock,
    Sale,
    Finance,
    System,
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementAction {
    ItemCreated,
    ItemDeleted,
    Replenished,
    QuickSale,
    BatchSale,
    BulkPriceUpdate,
    ManualEntry,
    CategorySeed,
    NegativeStock,
}

/// Optional cross-references carried by a movement
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MovementRefs {
    #[serde(default)]
    pub stock_item_id: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub sale_id: Option<i64>,
}

impl MovementRefs {
    pub fn item(id: i64) -> Self {
        Self {
            stock_item_id: Some(id),
            ..Self::default()
        }
    }

    pub fn transaction(id: i64) -> Self {
        Self {
            transaction_id: Some(id),
            ..Self::default()
        }
    }

    pub fn item_and_transaction(item_id: i64, tx_id: i64) -> Self {
        Self {
            stock_item_id: Some(item_id),
            transaction_id: Some(tx_id),
            sale_id: None,
        }
    }
}

/// Recorded movement row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditMovement {
    pub id: i64,
    pub category: MovementCategory,
    pub action: MovementAction,
    pub description: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stock_item_id: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub sale_id: Option<i64>,
}
