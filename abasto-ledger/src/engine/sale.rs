//! Batch sale: pre-validate, commit, compensate
//!
//! The store executes each row operation independently, so a multi-line
//! sale is a saga:
//!
//! 1. Pre-validation pass, read-only. Resolves every line's sale unit
//!    and price, checks availability. Any failure aborts with no writes.
//! 2. Commit pass. Re-fetches each item and deducts. A line failing
//!    here (stock vanished concurrently, store error, timeout) triggers
//!    best-effort rollback of the lines already deducted.
//! 3. Post-commit: income entry, one sale line per item, one movement.
//!    Failures here are NOT rolled back: stock is already gone, so they
//!    surface as `PartialCommitInconsistency` for manual reconciliation.
//!
//! Two concurrent sales can both pass pre-validation on the same stale
//! count; the loser fails at commit with `ConcurrentModification` and is
//! fully compensated. Quantities never go negative.

use serde_json::json;
use shared::models::{
    CategoryType, EntryType, MovementAction, MovementCategory, MovementRefs, SaleLineRequest,
    SaleReceipt, StockItem,
};

use super::{InventoryLedger, SALES_TABLE, STOCK_TABLE, status_for};
use crate::categories::BEVERAGE_SALES_CATEGORY;
use crate::error::{LedgerError, LedgerResult};
use crate::money;

/// Default receipt description when the caller gives none
const DIRECT_SALE_DESCRIPTION: &str = "Venta Directa Salón";

/// One line after price/unit resolution
struct ResolvedLine {
    item_id: i64,
    /// Base units deducted from stock (quantity × pack size)
    units: f64,
    /// Sale units as requested (packs or singles)
    quantity: f64,
    line_total: f64,
    description: String,
}

/// One applied deduction, tracked for rollback
struct Deduction {
    item_id: i64,
    prior_quantity: f64,
}

impl InventoryLedger {
    /// Process a multi-line sale as a compensated saga
    pub async fn batch_sale(
        &self,
        lines: Vec<SaleLineRequest>,
        description: Option<String>,
    ) -> LedgerResult<SaleReceipt> {
        if lines.is_empty() {
            return Err(LedgerError::invalid("no items in sale"));
        }

        // Resolve the income category up front: a missing category must
        // fail before any stock is touched, not after.
        let sale_category_id = self
            .categories()
            .ensure(BEVERAGE_SALES_CATEGORY, CategoryType::Income)
            .await?;

        // ========== 1. Pre-validation pass (read-only) ==========
        let mut resolved = Vec::with_capacity(lines.len());
        for line in &lines {
            resolved.push(self.resolve_line(line).await?);
        }

        // ========== 2. Commit pass ==========
        let mut committed: Vec<Deduction> = Vec::with_capacity(resolved.len());
        for line in &resolved {
            if let Err(err) = self.deduct_line(line, &mut committed).await {
                self.rollback(&committed).await;
                return Err(err);
            }
        }

        // ========== 3. Post-commit writes (not compensated) ==========
        let total = money::to_f64(
            resolved
                .iter()
                .map(|line| money::to_decimal(line.line_total))
                .sum(),
        );
        let description = description.unwrap_or_else(|| DIRECT_SALE_DESCRIPTION.to_string());

        let entry = self
            .insert_entry(total, &description, EntryType::Income, sale_category_id)
            .await
            .map_err(|err| self.partial_commit(None, err))?;

        for line in &resolved {
            let written = self
                .client()
                .table(SALES_TABLE)
                .insert(json!({
                    "stock_item_id": line.item_id,
                    "quantity": line.quantity,
                    "description": line.description,
                    "sale_price_total": line.line_total,
                    "sale_tx_id": entry.id,
                    "date": chrono::Utc::now(),
                }))
                .execute()
                .await
                .and_then(|resp| resp.into_result());
            if let Err(err) = written {
                return Err(self.partial_commit(Some(entry.id), err.into()));
            }
        }

        self.movements()
            .record(
                MovementCategory::Sale,
                MovementAction::BatchSale,
                format!("Venta procesada: {} productos — ${:.2}", resolved.len(), total),
                json!({"transaction_id": entry.id, "items": resolved.len(), "total": total}),
                MovementRefs::transaction(entry.id),
            )
            .await;

        Ok(SaleReceipt {
            transaction_id: entry.id,
            total,
        })
    }

    /// Resolve sale unit, price and availability for one line. Read-only.
    async fn resolve_line(&self, line: &SaleLineRequest) -> LedgerResult<ResolvedLine> {
        if line.quantity <= 0.0 {
            return Err(LedgerError::invalid("sale quantity must be positive"));
        }

        let item = self.fetch_item(line.item_id).await?;
        let (pack_size, unit_price) = self.resolve_sale_unit(line, &item).await?;

        let units = line.quantity * pack_size as f64;
        if item.quantity < units {
            return Err(LedgerError::insufficient(
                item.display_name(),
                item.quantity,
                units,
            ));
        }

        let mut description = item.display_name();
        if line.is_pack {
            description.push_str(&format!(" (Pack x{pack_size})"));
        }

        Ok(ResolvedLine {
            item_id: line.item_id,
            units,
            quantity: line.quantity,
            line_total: money::line_total(unit_price, line.quantity),
            description,
        })
    }

    /// Pack size and per-sale-unit price for a line
    ///
    /// Pack sales price from an explicit format when `format_id` is given,
    /// else from the item's own pack fields, falling back to
    /// `selling_price × pack_size`.
    async fn resolve_sale_unit(
        &self,
        line: &SaleLineRequest,
        item: &StockItem,
    ) -> LedgerResult<(i64, f64)> {
        if !line.is_pack {
            let price = item.selling_price.ok_or_else(|| {
                LedgerError::invalid(format!("{} has no selling price", item.display_name()))
            })?;
            return Ok((1, price));
        }

        if let Some(format_id) = line.format_id {
            let format = self.fetch_format(format_id).await?;
            return Ok((format.pack_size.max(1), format.pack_price));
        }

        let pack_size = item.pack_size.max(1);
        let price = item
            .pack_price
            .or_else(|| {
                item.selling_price
                    .map(|p| money::line_total(p, pack_size as f64))
            })
            .ok_or_else(|| {
                LedgerError::invalid(format!("{} has no pack price", item.display_name()))
            })?;
        Ok((pack_size, price))
    }

    /// Re-fetch and deduct one line, recording it for potential rollback
    async fn deduct_line(
        &self,
        line: &ResolvedLine,
        committed: &mut Vec<Deduction>,
    ) -> LedgerResult<()> {
        // Fresh read: shrink the race window against concurrent sales
        let item = self.fetch_item(line.item_id).await?;
        if item.quantity < line.units {
            return Err(LedgerError::concurrent(
                item.display_name(),
                item.quantity,
                line.units,
            ));
        }

        let mut new_quantity = item.quantity - line.units;
        if new_quantity < 0.0 {
            // Unreachable given the check above, but a concurrent writer
            // owns the truth; clamp and flag rather than store a negative.
            tracing::warn!(item_id = item.id, new_quantity, "negative stock clamped to zero");
            self.movements()
                .record(
                    MovementCategory::System,
                    MovementAction::NegativeStock,
                    format!("Stock negativo detectado: {}", item.display_name()),
                    json!({"item_id": item.id, "computed": new_quantity}),
                    MovementRefs::item(item.id),
                )
                .await;
            new_quantity = 0.0;
        }

        self.client()
            .table(STOCK_TABLE)
            .update(json!({
                "quantity": new_quantity,
                "status": status_for(new_quantity),
            }))
            .eq("id", line.item_id)
            .execute()
            .await?
            .into_result()?;

        committed.push(Deduction {
            item_id: line.item_id,
            prior_quantity: item.quantity,
        });
        Ok(())
    }

    /// Best-effort compensation: restore prior quantities, newest first
    ///
    /// A failure here is logged and swallowed: re-raising would leave the
    /// caller with less information, not more recourse.
    async fn rollback(&self, committed: &[Deduction]) {
        for deduction in committed.iter().rev() {
            let restore = self
                .client()
                .table(STOCK_TABLE)
                .update(json!({
                    "quantity": deduction.prior_quantity,
                    "status": shared::models::StockStatus::Available,
                }))
                .eq("id", deduction.item_id)
                .execute()
                .await
                .and_then(|resp| resp.into_result());

            if let Err(err) = restore {
                tracing::error!(
                    item_id = deduction.item_id,
                    prior_quantity = deduction.prior_quantity,
                    %err,
                    "rollback write failed, stock left deducted"
                );
            }
        }
    }

    /// Wrap a post-commit failure as the loud, distinct drift condition
    fn partial_commit(&self, transaction_id: Option<i64>, err: LedgerError) -> LedgerError {
        tracing::error!(
            ?transaction_id,
            %err,
            "ledger write failed after stock was deducted, manual reconciliation required"
        );
        LedgerError::PartialCommitInconsistency {
            transaction_id,
            detail: err.to_string(),
        }
    }
}
