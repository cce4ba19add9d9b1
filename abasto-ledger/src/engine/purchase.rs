//! Purchase intake: one new item, one expense entry, one audit movement

use chrono::Utc;
use serde_json::json;
use shared::models::{
    CategoryType, EntryType, MovementAction, MovementCategory, MovementRefs, NewStockItem,
    StockItem, StockStatus,
};

use super::{InventoryLedger, STOCK_TABLE};
use crate::categories::MERCH_PURCHASE_CATEGORY;
use crate::error::{LedgerError, LedgerResult};
use crate::money;

impl InventoryLedger {
    /// Register a brand-new item bought into stock
    ///
    /// Sequence: resolve/create the merchandise expense category, insert
    /// the expense entry, insert the stock item referencing it, record a
    /// movement. The steps are independent REST calls: a stock-item
    /// failure after the entry was written leaves an orphan entry, which
    /// is surfaced to the caller rather than silently swallowed.
    pub async fn create_purchase(&self, item: NewStockItem) -> LedgerResult<StockItem> {
        if item.name.trim().is_empty() {
            return Err(LedgerError::invalid("stock item name must not be empty"));
        }
        if item.initial_quantity <= 0.0 {
            return Err(LedgerError::invalid("initial quantity must be positive"));
        }

        let pack_size = item.pack_size.max(1);
        let units = item.initial_quantity * pack_size as f64;
        let unit_cost = money::lot_unit_cost(item.cost_amount, units);

        // 1. Expense entry for the purchase cost (zero-cost intakes skip it)
        let mut purchase_tx_id = None;
        if item.cost_amount > 0.0 {
            let category_id = self
                .categories()
                .ensure(MERCH_PURCHASE_CATEGORY, CategoryType::Expense)
                .await?;
            let entry = self
                .insert_entry(
                    money::round2(item.cost_amount),
                    &format!("Compra: {}", item.name),
                    EntryType::Expense,
                    category_id,
                )
                .await?;
            purchase_tx_id = Some(entry.id);
        }

        // 2. Stock item referencing the entry
        let created: Result<StockItem, LedgerError> = async {
            self.client()
                .table(STOCK_TABLE)
                .insert(json!({
                    "name": item.name,
                    "brand": item.brand,
                    "barcode": item.barcode,
                    "quantity": units,
                    "initial_quantity": item.initial_quantity,
                    "cost_amount": money::round2(item.cost_amount),
                    "unit_cost": unit_cost,
                    "selling_price": item.selling_price,
                    "is_pack": item.is_pack,
                    "pack_size": pack_size,
                    "pack_price": item.pack_price,
                    "category_id": item.category_id,
                    "status": StockStatus::Available,
                    "purchase_tx_id": purchase_tx_id,
                    "purchase_date": Utc::now(),
                }))
                .execute()
                .await?
                .first()?
                .ok_or_else(|| LedgerError::invalid("stock item insert returned no representation"))
        }
        .await;

        let created = match created {
            Ok(created) => created,
            Err(err) => {
                if let Some(entry_id) = purchase_tx_id {
                    tracing::error!(
                        entry_id,
                        %err,
                        "stock item insert failed after expense entry was written, entry is orphaned"
                    );
                }
                return Err(err);
            }
        };

        // 3. Audit movement, best effort
        self.movements()
            .record(
                MovementCategory::Stock,
                MovementAction::ItemCreated,
                format!("Producto creado: {}", created.display_name()),
                json!({"item_id": created.id, "quantity": created.quantity}),
                MovementRefs::item(created.id),
            )
            .await;

        Ok(created)
    }
}
