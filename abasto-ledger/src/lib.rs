//! Inventory-ledger engine over a PostgREST-style data store
//!
//! Emulates atomic multi-row stock mutations with independent single-row
//! REST calls: pre-validation, ordered commits and compensating rollback
//! instead of store-side transactions. See [`engine`] for the saga
//! semantics and [`error::LedgerError`] for the failure taxonomy.

pub mod categories;
pub mod engine;
pub mod error;
pub mod money;
pub mod movements;

pub use categories::{
    BEVERAGE_SALES_CATEGORY, CategoryCache, CategoryDirectory, MERCH_PURCHASE_CATEGORY,
};
pub use engine::{InventoryLedger, MonthlySummary};
pub use error::{LedgerError, LedgerResult};
pub use movements::MovementLog;
