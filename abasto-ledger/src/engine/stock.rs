//! Stock views and single-item operations

use std::collections::HashMap;

use abasto_client::SortDir;
use serde_json::{Map, Value, json};
use shared::models::{
    BulkPriceUpdate, CategoryType, EntryType, MovementAction, MovementCategory, MovementRefs,
    PackFormat, QuickSaleOutcome, StockItem, StockItemWithFormats,
};

use super::{FORMATS_TABLE, InventoryLedger, STOCK_TABLE, status_for};
use crate::categories::BEVERAGE_SALES_CATEGORY;
use crate::error::{LedgerError, LedgerResult};
use crate::money;

impl InventoryLedger {
    /// All stock items with their formats embedded
    ///
    /// Formats are batch-fetched with one membership query instead of
    /// one query per item.
    pub async fn list_stock(&self) -> LedgerResult<Vec<StockItemWithFormats>> {
        let items: Vec<StockItem> = self
            .client()
            .table(STOCK_TABLE)
            .select("*")
            .order("name", SortDir::Asc)
            .execute()
            .await?
            .rows()?;

        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        let formats: Vec<PackFormat> = self
            .client()
            .table(FORMATS_TABLE)
            .select("*")
            .in_list("stock_item_id", &ids)
            .execute()
            .await?
            .rows()?;

        let mut by_item: HashMap<i64, Vec<PackFormat>> = HashMap::new();
        for format in formats {
            by_item.entry(format.stock_item_id).or_default().push(format);
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let formats = by_item.remove(&item.id).unwrap_or_default();
                StockItemWithFormats { item, formats }
            })
            .collect())
    }

    /// Distinct brand names, sorted
    pub async fn brands(&self) -> LedgerResult<Vec<String>> {
        let items: Vec<StockItem> = self
            .client()
            .table(STOCK_TABLE)
            .select("*")
            .execute()
            .await?
            .rows()?;

        let mut brands: Vec<String> = items
            .into_iter()
            .filter_map(|item| item.brand)
            .filter(|brand| !brand.is_empty())
            .collect();
        brands.sort();
        brands.dedup();
        Ok(brands)
    }

    /// Delete an item together with its formats
    pub async fn delete_item(&self, item_id: i64) -> LedgerResult<()> {
        let item = self.fetch_item(item_id).await?;

        // Owned formats go first
        self.client()
            .table(FORMATS_TABLE)
            .delete()
            .eq("stock_item_id", item_id)
            .execute()
            .await?
            .into_result()?;
        self.client()
            .table(STOCK_TABLE)
            .delete()
            .eq("id", item_id)
            .execute()
            .await?
            .into_result()?;

        self.movements()
            .record(
                MovementCategory::Stock,
                MovementAction::ItemDeleted,
                format!("Producto eliminado: {}", item.name),
                json!({"item_id": item_id}),
                MovementRefs::item(item_id),
            )
            .await;
        Ok(())
    }

    /// Quick single-item sale: deduct stock, write one income entry
    pub async fn quick_sale(
        &self,
        item_id: i64,
        quantity: f64,
        price_override: Option<f64>,
    ) -> LedgerResult<QuickSaleOutcome> {
        if quantity <= 0.0 {
            return Err(LedgerError::invalid("sale quantity must be positive"));
        }

        let item = self.fetch_item(item_id).await?;
        if item.quantity < quantity {
            return Err(LedgerError::insufficient(
                item.display_name(),
                item.quantity,
                quantity,
            ));
        }

        let unit_price = price_override.or(item.selling_price).ok_or_else(|| {
            LedgerError::invalid(format!("{} has no selling price", item.display_name()))
        })?;
        let total = money::line_total(unit_price, quantity);
        let remaining = item.quantity - quantity;

        self.client()
            .table(STOCK_TABLE)
            .update(json!({
                "quantity": remaining,
                "status": status_for(remaining),
            }))
            .eq("id", item_id)
            .execute()
            .await?
            .into_result()?;

        let category_id = self
            .categories()
            .ensure(BEVERAGE_SALES_CATEGORY, CategoryType::Income)
            .await?;
        let entry = self
            .insert_entry(
                total,
                &format!("Venta: {} x{}", item.name, quantity),
                EntryType::Income,
                category_id,
            )
            .await
            .map_err(|err| {
                tracing::error!(item_id, %err, "income entry failed after quick-sale deduction");
                LedgerError::PartialCommitInconsistency {
                    transaction_id: None,
                    detail: err.to_string(),
                }
            })?;

        self.movements()
            .record(
                MovementCategory::Sale,
                MovementAction::QuickSale,
                format!("Venta rápida: {} x{}", item.name, quantity),
                json!({"item_id": item_id, "quantity": quantity, "total": total}),
                MovementRefs::item_and_transaction(item_id, entry.id),
            )
            .await;

        Ok(QuickSaleOutcome {
            transaction_id: entry.id,
            remaining,
            total,
        })
    }

    /// Percentage price adjustment over a filtered set of items
    ///
    /// Applies to selling price, unit cost and pack prices, including the
    /// items' alternate formats. Returns the number of items touched.
    pub async fn bulk_update_prices(&self, request: BulkPriceUpdate) -> LedgerResult<usize> {
        let mut query = self.client().table(STOCK_TABLE).select("*");
        if let Some(category_id) = request.category_id {
            query = query.eq("category_id", category_id);
        }
        if let Some(brand) = request.brand.as_deref() {
            if !brand.trim().is_empty() {
                query = query.ilike("brand", &format!("%{brand}%"));
            }
        }

        let items: Vec<StockItem> = query.execute().await?.rows()?;
        if items.is_empty() {
            return Err(LedgerError::not_found("stock items matching the filter"));
        }

        let multiplier = 1.0 + request.percentage / 100.0;
        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        let formats: Vec<PackFormat> = self
            .client()
            .table(FORMATS_TABLE)
            .select("*")
            .in_list("stock_item_id", &ids)
            .execute()
            .await?
            .rows()?;

        for item in &items {
            let mut changes = Map::new();
            changes.insert(
                "selling_price".into(),
                json!(money::scale(item.selling_price.unwrap_or(0.0), multiplier)),
            );
            changes.insert(
                "unit_cost".into(),
                json!(money::scale(item.unit_cost, multiplier)),
            );
            if let Some(pack_price) = item.pack_price {
                changes.insert(
                    "pack_price".into(),
                    json!(money::scale(pack_price, multiplier)),
                );
            }
            self.client()
                .table(STOCK_TABLE)
                .update(Value::Object(changes))
                .eq("id", item.id)
                .execute()
                .await?
                .into_result()?;
        }

        for format in &formats {
            self.client()
                .table(FORMATS_TABLE)
                .update(json!({
                    "pack_price": money::scale(format.pack_price, multiplier),
                }))
                .eq("id", format.id)
                .execute()
                .await?
                .into_result()?;
        }

        self.movements()
            .record(
                MovementCategory::Stock,
                MovementAction::BulkPriceUpdate,
                format!(
                    "Actualización masiva de precios: {:+.1}% a {} productos",
                    request.percentage,
                    items.len()
                ),
                json!({
                    "percentage": request.percentage,
                    "category_id": request.category_id,
                    "brand": request.brand,
                    "items_updated": items.len(),
                }),
                MovementRefs::default(),
            )
            .await;

        Ok(items.len())
    }
}
