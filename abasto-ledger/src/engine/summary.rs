//! Monthly income/expense summary

use abasto_client::SortDir;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::AuditMovement;

use super::{ENTRIES_TABLE, InventoryLedger};
use crate::error::{LedgerError, LedgerResult};
use crate::money;
use crate::movements::MOVEMENTS_TABLE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
    pub recent_sales: Vec<AuditMovement>,
}

impl InventoryLedger {
    /// Income, expenses and balance for one calendar month
    pub async fn monthly_summary(&self, year: i32, month: u32) -> LedgerResult<MonthlySummary> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::invalid(format!("invalid month {month}")));
        }

        let month_start = format!("{year}-{month:02}-01");
        let month_end = if month == 12 {
            format!("{}-01-01", year + 1)
        } else {
            format!("{year}-{:02}-01", month + 1)
        };

        let total_income = self.sum_entries("INCOME", &month_start, &month_end).await?;
        let total_expense = self.sum_entries("EXPENSE", &month_start, &month_end).await?;

        let recent_sales: Vec<AuditMovement> = self
            .client()
            .table(MOVEMENTS_TABLE)
            .select("*")
            .eq("category", "sale")
            .order("created_at", SortDir::Desc)
            .limit(3)
            .execute()
            .await?
            .rows()?;

        Ok(MonthlySummary {
            total_income,
            total_expense,
            net_balance: money::to_f64(
                money::to_decimal(total_income) - money::to_decimal(total_expense),
            ),
            recent_sales,
        })
    }

    async fn sum_entries(&self, kind: &str, start: &str, end: &str) -> LedgerResult<f64> {
        let rows: Vec<Value> = self
            .client()
            .table(ENTRIES_TABLE)
            .select("amount")
            .eq("type", kind)
            .gte("date", start)
            .lt("date", end)
            .execute()
            .await?
            .rows()?;

        let sum: Decimal = rows
            .iter()
            .filter_map(|row| row.get("amount").and_then(Value::as_f64))
            .map(money::to_decimal)
            .sum();
        Ok(money::to_f64(sum))
    }
}
