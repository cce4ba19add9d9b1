//! Replenishment: merge new lots into existing items at weighted-average cost

use serde_json::{Map, Value, json};
use shared::models::{
    CategoryType, EntryType, MovementAction, MovementCategory, MovementRefs, ReplenishLot,
    ReplenishOutcome, StockItem, StockStatus,
};

use super::{FORMATS_TABLE, InventoryLedger, STOCK_TABLE};
use crate::categories::MERCH_PURCHASE_CATEGORY;
use crate::error::{LedgerError, LedgerResult};
use crate::money;

impl InventoryLedger {
    /// Apply one or more replenishment lots, sequentially
    ///
    /// Lots are independent single-row operations; the batch aborts on
    /// the first failing lot and already-applied lots stay applied (each
    /// lot is individually consistent, there is nothing to compensate).
    pub async fn replenish(&self, lots: Vec<ReplenishLot>) -> LedgerResult<Vec<ReplenishOutcome>> {
        if lots.is_empty() {
            return Err(LedgerError::invalid("no lots to replenish"));
        }

        let mut outcomes = Vec::with_capacity(lots.len());
        for lot in lots {
            outcomes.push(self.apply_lot(lot).await?);
        }
        Ok(outcomes)
    }

    async fn apply_lot(&self, lot: ReplenishLot) -> LedgerResult<ReplenishOutcome> {
        if lot.quantity <= 0.0 {
            return Err(LedgerError::invalid("lot quantity must be positive"));
        }

        let item = self.fetch_item(lot.item_id).await?;

        let pack_size = if lot.is_pack {
            lot.pack_size.unwrap_or(item.pack_size).max(1)
        } else {
            1
        };
        let added_units = lot.quantity * pack_size as f64;
        let new_quantity = item.quantity + added_units;
        let new_unit_cost =
            money::weighted_unit_cost(item.quantity, item.unit_cost, lot.cost_amount, new_quantity);

        // Replenishing always brings the item back to AVAILABLE
        let mut changes = Map::new();
        changes.insert("quantity".into(), json!(new_quantity));
        changes.insert("unit_cost".into(), json!(new_unit_cost));
        changes.insert("status".into(), json!(StockStatus::Available));
        if let Some(price) = lot.selling_price {
            changes.insert("selling_price".into(), json!(price));
        }
        if let Some(price) = lot.pack_price {
            changes.insert("pack_price".into(), json!(price));
        }

        self.client()
            .table(STOCK_TABLE)
            .update(Value::Object(changes))
            .eq("id", lot.item_id)
            .execute()
            .await?
            .into_result()?;

        // A lot with a different pack size introduces an alternate sale
        // unit instead of overwriting the item's primary pack fields
        if lot.is_pack && pack_size != item.pack_size {
            self.upsert_lot_format(&item, &lot, pack_size).await?;
        }

        if lot.cost_amount > 0.0 {
            let category_id = self
                .categories()
                .ensure(MERCH_PURCHASE_CATEGORY, CategoryType::Expense)
                .await?;
            self.insert_entry(
                money::round2(lot.cost_amount),
                &format!("Reposición: {}", item.name),
                EntryType::Expense,
                category_id,
            )
            .await?;
        }

        self.movements()
            .record(
                MovementCategory::Stock,
                MovementAction::Replenished,
                format!("Reposición: {} (+{} unidades)", item.name, added_units),
                json!({
                    "item_id": lot.item_id,
                    "added": added_units,
                    "new_total": new_quantity,
                    "new_unit_cost": new_unit_cost,
                }),
                MovementRefs::item(lot.item_id),
            )
            .await;

        Ok(ReplenishOutcome {
            item_id: lot.item_id,
            added_units,
            new_quantity,
            new_unit_cost,
        })
    }

    /// Create or refresh the PackFormat matching (stock_item_id, pack_size)
    async fn upsert_lot_format(
        &self,
        item: &StockItem,
        lot: &ReplenishLot,
        pack_size: i64,
    ) -> LedgerResult<()> {
        let price = lot
            .pack_price
            .or_else(|| item.selling_price.map(|p| money::line_total(p, pack_size as f64)));
        let Some(price) = price else {
            tracing::debug!(
                item_id = item.id,
                pack_size,
                "lot introduces a new pack size but no price is derivable, skipping format"
            );
            return Ok(());
        };

        self.client()
            .table(FORMATS_TABLE)
            .upsert(
                json!({
                    "stock_item_id": item.id,
                    "pack_size": pack_size,
                    "pack_price": money::round2(price),
                    "label": lot.label,
                }),
                "stock_item_id,pack_size",
            )
            .execute()
            .await?
            .into_result()?;
        Ok(())
    }
}
