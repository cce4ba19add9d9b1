//! Sale line models (the `sales` table)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-item record of a committed sale
///
/// Child of exactly one income ledger entry (`sale_tx_id`) and one stock
/// item; created only as part of a successful batch sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: i64,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub stock_item_id: i64,
    /// Sale units (packs or base units, per the cart line)
    pub quantity: f64,
    pub description: String,
    pub sale_price_total: f64,
    pub sale_tx_id: i64,
}

/// One cart line in a batch-sale request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub item_id: i64,
    pub quantity: f64,
    #[serde(default)]
    pub is_pack: bool,
    /// Explicit pack format; falls back to the item's own pack fields
    #[serde(default)]
    pub format_id: Option<i64>,
}

/// Receipt for a committed batch sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub transaction_id: i64,
    pub total: f64,
}
