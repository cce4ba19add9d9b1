//! Manual ledger entries and listings

use abasto_client::SortDir;
use serde_json::json;
use shared::models::{
    AuditMovement, LedgerEntry, LedgerEntryCreate, MovementAction, MovementCategory, MovementRefs,
    SaleLine,
};

use super::{ENTRIES_TABLE, InventoryLedger, SALES_TABLE};
use crate::error::{LedgerError, LedgerResult};
use crate::money;
use crate::movements::MOVEMENTS_TABLE;

impl InventoryLedger {
    /// Record a manual income or expense entry
    pub async fn create_entry(&self, entry: LedgerEntryCreate) -> LedgerResult<LedgerEntry> {
        if entry.amount <= 0.0 {
            return Err(LedgerError::invalid("entry amount must be positive"));
        }

        let created = self
            .insert_entry(
                money::round2(entry.amount),
                &entry.description,
                entry.kind,
                entry.category_id,
            )
            .await?;

        self.movements()
            .record(
                MovementCategory::Finance,
                MovementAction::ManualEntry,
                format!("Transacción {:?}: ${}", created.kind, created.amount),
                json!({"amount": created.amount, "type": created.kind}),
                MovementRefs::transaction(created.id),
            )
            .await;
        Ok(created)
    }

    /// Ledger entries, newest first, paginated by row offset
    pub async fn list_entries(&self, skip: u64, limit: u64) -> LedgerResult<Vec<LedgerEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .client()
            .table(ENTRIES_TABLE)
            .select("*")
            .order("date", SortDir::Desc)
            .range(skip, skip + limit - 1)
            .execute()
            .await?
            .rows()?)
    }

    /// Sale lines belonging to one income entry (receipt detail)
    pub async fn sale_lines(&self, transaction_id: i64) -> LedgerResult<Vec<SaleLine>> {
        Ok(self
            .client()
            .table(SALES_TABLE)
            .select("*")
            .eq("sale_tx_id", transaction_id)
            .execute()
            .await?
            .rows()?)
    }

    /// Recent audit movements, newest first
    pub async fn list_movements(&self, limit: u64) -> LedgerResult<Vec<AuditMovement>> {
        Ok(self
            .client()
            .table(MOVEMENTS_TABLE)
            .select("*")
            .order("created_at", SortDir::Desc)
            .limit(limit)
            .execute()
            .await?
            .rows()?)
    }
}
