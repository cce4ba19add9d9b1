//! Inventory ledger engine
//!
//! Costed stock mutations over the REST store. The store offers no
//! cross-request transactions or row locks, so every multi-row operation
//! here defines its own ordering, validation and compensation protocol;
//! see [`sale`] for the batch-sale saga.

mod entries;
mod purchase;
mod replenish;
mod sale;
mod stock;
mod summary;

pub use summary::MonthlySummary;

use abasto_client::StoreClient;
use serde_json::json;
use shared::models::{EntryType, LedgerEntry, PackFormat, StockItem, StockStatus};

use crate::categories::{CategoryCache, CategoryDirectory};
use crate::error::{LedgerError, LedgerResult};
use crate::movements::MovementLog;

pub const STOCK_TABLE: &str = "stock_items";
pub const FORMATS_TABLE: &str = "stock_item_formats";
pub const ENTRIES_TABLE: &str = "transactions";
pub const SALES_TABLE: &str = "sales";

/// Entry point for all costed stock operations
#[derive(Clone)]
pub struct InventoryLedger {
    client: StoreClient,
    categories: CategoryDirectory,
    movements: MovementLog,
}

impl InventoryLedger {
    pub fn new(client: StoreClient) -> Self {
        Self::with_cache(client, CategoryCache::default())
    }

    /// Build with a caller-supplied category cache (shared across engines)
    pub fn with_cache(client: StoreClient, cache: CategoryCache) -> Self {
        Self {
            categories: CategoryDirectory::new(client.clone(), cache),
            movements: MovementLog::new(client.clone()),
            client,
        }
    }

    pub fn categories(&self) -> &CategoryDirectory {
        &self.categories
    }

    pub fn movements(&self) -> &MovementLog {
        &self.movements
    }

    pub(crate) fn client(&self) -> &StoreClient {
        &self.client
    }

    /// Seed the default category catalog, recording one movement when
    /// anything was actually added
    pub async fn seed_categories(&self) -> LedgerResult<usize> {
        let added = self.categories.seed_defaults().await?;
        if added > 0 {
            self.movements
                .record(
                    shared::models::MovementCategory::System,
                    shared::models::MovementAction::CategorySeed,
                    format!("Categorías iniciales creadas: {added}"),
                    json!({"added": added}),
                    shared::models::MovementRefs::default(),
                )
                .await;
        }
        Ok(added)
    }

    /// Fetch one stock item, failing with `NotFound` when absent
    pub(crate) async fn fetch_item(&self, item_id: i64) -> LedgerResult<StockItem> {
        self.client
            .table(STOCK_TABLE)
            .select("*")
            .eq("id", item_id)
            .single()
            .execute()
            .await?
            .single()?
            .ok_or_else(|| LedgerError::not_found(format!("stock item {item_id}")))
    }

    pub(crate) async fn fetch_format(&self, format_id: i64) -> LedgerResult<PackFormat> {
        self.client
            .table(FORMATS_TABLE)
            .select("*")
            .eq("id", format_id)
            .single()
            .execute()
            .await?
            .single()?
            .ok_or_else(|| LedgerError::not_found(format!("pack format {format_id}")))
    }

    /// Insert one immutable ledger entry, dated now
    pub(crate) async fn insert_entry(
        &self,
        amount: f64,
        description: &str,
        kind: EntryType,
        category_id: i64,
    ) -> LedgerResult<LedgerEntry> {
        self.client
            .table(ENTRIES_TABLE)
            .insert(json!({
                "amount": amount,
                "description": description,
                "type": kind,
                "category_id": category_id,
                "date": chrono::Utc::now(),
            }))
            .execute()
            .await?
            .first()?
            .ok_or_else(|| LedgerError::invalid("ledger entry insert returned no representation"))
    }
}

/// Status derived from quantity: depleted exactly at zero
pub(crate) fn status_for(quantity: f64) -> StockStatus {
    if quantity <= 0.0 {
        StockStatus::Depleted
    } else {
        StockStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tracks_quantity() {
        assert_eq!(status_for(0.0), StockStatus::Depleted);
        assert_eq!(status_for(-1.0), StockStatus::Depleted);
        assert_eq!(status_for(0.5), StockStatus::Available);
    }
}
