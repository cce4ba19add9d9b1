//! Stock item and pack format models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability status. DEPLETED if and only if quantity is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Available,
    Depleted,
}

/// Inventory row for one sellable product
///
/// `quantity` is always expressed in base units; pack-level sales deduct
/// `quantity × pack_size` units. `unit_cost` is the weighted-average cost
/// maintained by the replenishment flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    /// Current stock in base units, never negative
    pub quantity: f64,
    #[serde(default)]
    pub initial_quantity: f64,
    #[serde(default)]
    pub cost_amount: f64,
    /// Weighted-average cost per base unit
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub is_pack: bool,
    /// Default pack size (base units per pack), 1 for unit-only items
    #[serde(default = "default_pack_size")]
    pub pack_size: i64,
    #[serde(default)]
    pub pack_price: Option<f64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub status: StockStatus,
    #[serde(default)]
    pub purchase_tx_id: Option<i64>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
}

fn default_pack_size() -> i64 {
    1
}

impl StockItem {
    /// Display name including brand when present
    pub fn display_name(&self) -> String {
        match self.brand.as_deref() {
            Some(brand) if !brand.is_empty() => format!("{} {}", brand, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Alternate sale unit for a stock item (e.g. a 6-pack)
///
/// Owned exclusively by its parent item and deleted together with it.
/// At most one format per (stock_item_id, pack_size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackFormat {
    pub id: i64,
    pub stock_item_id: i64,
    pub pack_size: i64,
    pub pack_price: f64,
    #[serde(default)]
    pub label: Option<String>,
}

/// Listing view: item with its owned formats embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItemWithFormats {
    #[serde(flatten)]
    pub item: StockItem,
    #[serde(default)]
    pub formats: Vec<PackFormat>,
}

/// Purchase intake payload for a brand-new item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockItem {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    /// Total cost of the purchase lot
    pub cost_amount: f64,
    /// Lots purchased (packs when `is_pack`, base units otherwise)
    pub initial_quantity: f64,
    #[serde(default)]
    pub is_pack: bool,
    #[serde(default = "default_pack_size")]
    pub pack_size: i64,
    #[serde(default)]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub pack_price: Option<f64>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Replenishment lot for an existing item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishLot {
    pub item_id: i64,
    /// Lots received (packs when `is_pack`, base units otherwise)
    pub quantity: f64,
    #[serde(default)]
    pub is_pack: bool,
    /// Pack size of this lot when it differs from the item's default
    #[serde(default)]
    pub pack_size: Option<i64>,
    /// Total cost of the lot
    pub cost_amount: f64,
    #[serde(default)]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub pack_price: Option<f64>,
    /// Label for a pack format introduced by this lot (e.g. "Six pack")
    #[serde(default)]
    pub label: Option<String>,
}

/// Result of applying one replenishment lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishOutcome {
    pub item_id: i64,
    pub added_units: f64,
    pub new_quantity: f64,
    pub new_unit_cost: f64,
}

/// Result of a quick (single-item) sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickSaleOutcome {
    pub transaction_id: i64,
    pub remaining: f64,
    pub total: f64,
}

/// Percentage price adjustment over a filtered set of items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPriceUpdate {
    /// Signed percentage, e.g. 10.0 raises prices by 10%
    pub percentage: f64,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Substring match on brand, case-insensitive
    #[serde(default)]
    pub brand: Option<String>,
}
