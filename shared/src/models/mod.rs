//! Domain models
//!
//! Row types mirror the remote store's table schemas; payload structs are
//! the inputs accepted by the ledger engine.

mod category;
mod ledger_entry;
mod movement;
mod sale_line;
mod stock_item;

pub use category::{Category, CategoryCreate, CategoryType};
pub use ledger_entry::{EntryType, LedgerEntry, LedgerEntryCreate};
pub use movement::{AuditMovement, MovementAction, MovementCategory, MovementRefs};
pub use sale_line::{SaleLine, SaleLineRequest, SaleReceipt};
pub use stock_item::{
    BulkPriceUpdate, NewStockItem, PackFormat, QuickSaleOutcome, ReplenishLot, ReplenishOutcome,
    StockItem, StockItemWithFormats, StockStatus,
};
