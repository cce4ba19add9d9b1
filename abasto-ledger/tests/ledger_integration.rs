//! Ledger engine integration tests against the in-memory store
//!
//! The interesting properties live around the batch-sale saga: read-only
//! pre-validation, rollback round-trips, never-negative stock and the
//! loud partial-commit condition.

use abasto_client::StoreClient;
use abasto_ledger::{InventoryLedger, LedgerError};
use abasto_store_mock::{MockStore, in_memory_store};
use serde_json::json;
use shared::models::{
    BulkPriceUpdate, LedgerEntryCreate, NewStockItem, ReplenishLot, SaleLineRequest,
};

fn ledger() -> (MockStore, InventoryLedger) {
    let (store, router) = in_memory_store();
    let client = StoreClient::in_process(router, "test-key");
    (store, InventoryLedger::new(client))
}

fn seed_item(store: &MockStore, name: &str, quantity: f64, selling_price: f64) -> i64 {
    store.seed(
        "stock_items",
        vec![json!({
            "name": name,
            "quantity": quantity,
            "initial_quantity": quantity,
            "cost_amount": 0.0,
            "unit_cost": 0.0,
            "selling_price": selling_price,
            "is_pack": false,
            "pack_size": 1,
            "status": "AVAILABLE",
        })],
    );
    store.rows("stock_items").last().unwrap()["id"]
        .as_i64()
        .unwrap()
}

fn quantity_of(store: &MockStore, item_id: i64) -> f64 {
    store
        .rows("stock_items")
        .iter()
        .find(|row| row["id"] == item_id)
        .and_then(|row| row["quantity"].as_f64())
        .unwrap()
}

// ========== Purchase intake ==========

#[tokio::test]
async fn test_purchase_intake_creates_item_entry_and_movement() {
    let (store, ledger) = ledger();

    let created = ledger
        .create_purchase(NewStockItem {
            name: "Quilmes 1L".into(),
            brand: Some("Quilmes".into()),
            barcode: None,
            cost_amount: 150.0,
            initial_quantity: 2.0,
            is_pack: true,
            pack_size: 6,
            selling_price: Some(20.0),
            pack_price: Some(110.0),
            category_id: None,
        })
        .await
        .unwrap();

    // 2 packs of 6: 12 base units at 12.50 each
    assert_eq!(created.quantity, 12.0);
    assert_eq!(created.unit_cost, 12.5);

    let entries = store.rows("transactions");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "EXPENSE");
    assert_eq!(entries[0]["amount"], 150.0);
    assert_eq!(created.purchase_tx_id, entries[0]["id"].as_i64());

    let movements = store.rows("app_movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["action"], "item_created");
}

#[tokio::test]
async fn test_zero_cost_purchase_writes_no_entry() {
    let (store, ledger) = ledger();

    ledger
        .create_purchase(NewStockItem {
            name: "Muestra gratis".into(),
            brand: None,
            barcode: None,
            cost_amount: 0.0,
            initial_quantity: 5.0,
            is_pack: false,
            pack_size: 1,
            selling_price: Some(10.0),
            pack_price: None,
            category_id: None,
        })
        .await
        .unwrap();

    assert!(store.rows("transactions").is_empty());
}

// ========== Replenishment ==========

#[tokio::test]
async fn test_replenish_recomputes_weighted_average_cost() {
    let (store, ledger) = ledger();
    store.seed(
        "stock_items",
        vec![json!({
            "name": "Fernet", "quantity": 10.0, "initial_quantity": 10.0,
            "cost_amount": 50.0, "unit_cost": 5.0, "selling_price": 9.0,
            "is_pack": false, "pack_size": 1, "status": "DEPLETED",
        })],
    );

    let outcomes = ledger
        .replenish(vec![ReplenishLot {
            item_id: 1,
            quantity: 10.0,
            is_pack: false,
            pack_size: None,
            cost_amount: 70.0,
            selling_price: None,
            pack_price: None,
            label: None,
        }])
        .await
        .unwrap();

    // (10 * 5.00 + 70.00) / 20 = 6.00
    assert_eq!(outcomes[0].new_quantity, 20.0);
    assert_eq!(outcomes[0].new_unit_cost, 6.0);

    let row = &store.rows("stock_items")[0];
    assert_eq!(row["quantity"], 20.0);
    assert_eq!(row["status"], "AVAILABLE");

    let entries = store.rows("transactions");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "EXPENSE");
    assert_eq!(entries[0]["amount"], 70.0);
}

#[tokio::test]
async fn test_replenish_with_new_pack_size_creates_format() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Cerveza lata", 24.0, 3.0);

    ledger
        .replenish(vec![ReplenishLot {
            item_id,
            quantity: 4.0,
            is_pack: true,
            pack_size: Some(6),
            cost_amount: 60.0,
            selling_price: None,
            pack_price: Some(16.5),
            label: Some("Six pack".into()),
        }])
        .await
        .unwrap();

    assert_eq!(quantity_of(&store, item_id), 48.0);
    let formats = store.rows("stock_item_formats");
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0]["pack_size"], 6);
    assert_eq!(formats[0]["pack_price"], 16.5);

    // Same pack size again merges instead of duplicating
    ledger
        .replenish(vec![ReplenishLot {
            item_id,
            quantity: 1.0,
            is_pack: true,
            pack_size: Some(6),
            cost_amount: 15.0,
            selling_price: None,
            pack_price: Some(17.0),
            label: None,
        }])
        .await
        .unwrap();
    let formats = store.rows("stock_item_formats");
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0]["pack_price"], 17.0);
}

#[tokio::test]
async fn test_replenish_missing_item_is_not_found() {
    let (_store, ledger) = ledger();
    let err = ledger
        .replenish(vec![ReplenishLot {
            item_id: 404,
            quantity: 1.0,
            is_pack: false,
            pack_size: None,
            cost_amount: 10.0,
            selling_price: None,
            pack_price: None,
            label: None,
        }])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

// ========== Batch sale ==========

fn unit_line(item_id: i64, quantity: f64) -> SaleLineRequest {
    SaleLineRequest {
        item_id,
        quantity,
        is_pack: false,
        format_id: None,
    }
}

#[tokio::test]
async fn test_batch_sale_deduction_sum_and_single_entry() {
    let (store, ledger) = ledger();
    let a = seed_item(&store, "Gaseosa", 20.0, 4.0);
    let b = seed_item(&store, "Agua", 15.0, 2.5);

    let receipt = ledger
        .batch_sale(vec![unit_line(a, 3.0), unit_line(b, 4.0)], None)
        .await
        .unwrap();

    // Per-line deduction equals the quantity delta for each item
    assert_eq!(quantity_of(&store, a), 17.0);
    assert_eq!(quantity_of(&store, b), 11.0);

    // One income entry whose amount is the sum of the line totals
    assert_eq!(receipt.total, 3.0 * 4.0 + 4.0 * 2.5);
    let entries = store.rows("transactions");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "INCOME");
    assert_eq!(entries[0]["amount"], receipt.total);

    // One sale line per item, all referencing the entry
    let sales = store.rows("sales");
    assert_eq!(sales.len(), 2);
    for sale in &sales {
        assert_eq!(sale["sale_tx_id"].as_i64(), Some(receipt.transaction_id));
    }
    let line_sum: f64 = sales
        .iter()
        .map(|s| s["sale_price_total"].as_f64().unwrap())
        .sum();
    assert_eq!(line_sum, receipt.total);

    // Receipt detail lookup returns the same lines, typed
    let lines = ledger.sale_lines(receipt.transaction_id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.sale_tx_id == receipt.transaction_id));
}

#[tokio::test]
async fn test_pack_line_uses_explicit_format() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Cerveza lata", 24.0, 3.0);
    store.seed(
        "stock_item_formats",
        vec![json!({"stock_item_id": item_id, "pack_size": 6, "pack_price": 16.0})],
    );

    let receipt = ledger
        .batch_sale(
            vec![SaleLineRequest {
                item_id,
                quantity: 2.0,
                is_pack: true,
                format_id: Some(1),
            }],
            Some("Venta mostrador".into()),
        )
        .await
        .unwrap();

    // 2 six-packs: 12 base units off, priced per format
    assert_eq!(quantity_of(&store, item_id), 12.0);
    assert_eq!(receipt.total, 32.0);
}

#[tokio::test]
async fn test_insufficient_stock_prevalidation_is_read_only() {
    let (store, ledger) = ledger();
    let a = seed_item(&store, "Item A", 3.0, 5.0);
    let b = seed_item(&store, "Item B", 10.0, 5.0);

    let err = ledger
        .batch_sale(vec![unit_line(a, 5.0), unit_line(b, 1.0)], None)
        .await
        .unwrap_err();

    match err {
        LedgerError::InsufficientStock {
            item,
            available,
            requested,
        } => {
            assert_eq!(item, "Item A");
            assert_eq!(available, 3.0);
            assert_eq!(requested, 5.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // No writes happened in the pre-validation pass
    assert_eq!(quantity_of(&store, a), 3.0);
    assert_eq!(quantity_of(&store, b), 10.0);
    assert!(store.rows("transactions").is_empty());
    assert!(store.rows("sales").is_empty());
}

#[tokio::test]
async fn test_commit_failure_rolls_back_earlier_deductions() {
    let (store, ledger) = ledger();
    let a = seed_item(&store, "Primero", 10.0, 2.0);
    let b = seed_item(&store, "Segundo", 10.0, 2.0);

    // First stock write (deducting item A) succeeds, second fails
    store.fail_nth_write("stock_items", 2);

    let err = ledger
        .batch_sale(vec![unit_line(a, 4.0), unit_line(b, 4.0)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));

    // Item A's deduction was compensated
    assert_eq!(quantity_of(&store, a), 10.0);
    assert_eq!(quantity_of(&store, b), 10.0);
    assert!(store.rows("transactions").is_empty());
}

#[tokio::test]
async fn test_stale_prevalidation_fails_at_commit_and_compensates() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Última unidad", 1.0, 7.0);

    // Both lines pass pre-validation against the same count of 1; the
    // second line's fresh commit-pass read sees the stock is gone.
    let err = ledger
        .batch_sale(vec![unit_line(item_id, 1.0), unit_line(item_id, 1.0)], None)
        .await
        .unwrap_err();

    match err {
        LedgerError::ConcurrentModification {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 0.0);
            assert_eq!(requested, 1.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The first deduction was rolled back; quantity never went negative
    assert_eq!(quantity_of(&store, item_id), 1.0);
}

#[tokio::test]
async fn test_double_sale_of_last_unit_never_goes_negative() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Último vino", 1.0, 30.0);

    let first = ledger.batch_sale(vec![unit_line(item_id, 1.0)], None).await;
    let second = ledger.batch_sale(vec![unit_line(item_id, 1.0)], None).await;

    assert!(first.is_ok());
    assert!(matches!(
        second.unwrap_err(),
        LedgerError::InsufficientStock { .. }
    ));
    assert_eq!(quantity_of(&store, item_id), 0.0);
    let row = &store.rows("stock_items")[0];
    assert_eq!(row["status"], "DEPLETED");
}

#[tokio::test]
async fn test_ledger_write_failure_after_deduction_is_partial_commit() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Gaseosa", 10.0, 4.0);

    // Category resolution runs before the commit pass; the entry insert
    // is therefore the first write to the transactions table.
    store.fail_nth_write("transactions", 1);

    let err = ledger
        .batch_sale(vec![unit_line(item_id, 2.0)], None)
        .await
        .unwrap_err();

    match err {
        LedgerError::PartialCommitInconsistency { transaction_id, .. } => {
            assert!(transaction_id.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Documented drift: the deduction is NOT rolled back
    assert_eq!(quantity_of(&store, item_id), 8.0);
}

#[tokio::test]
async fn test_sale_line_failure_reports_transaction_id() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Agua", 10.0, 2.0);

    store.fail_nth_write("sales", 1);

    let err = ledger
        .batch_sale(vec![unit_line(item_id, 1.0)], None)
        .await
        .unwrap_err();

    match err {
        LedgerError::PartialCommitInconsistency { transaction_id, .. } => {
            let entries = store.rows("transactions");
            assert_eq!(transaction_id, entries[0]["id"].as_i64());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_batch_is_invalid() {
    let (_store, ledger) = ledger();
    let err = ledger.batch_sale(vec![], None).await.unwrap_err();
    assert!(matches!(err, LedgerError::Invalid(_)));
}

// ========== Audit logging ==========

#[tokio::test]
async fn test_audit_failure_never_propagates() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Gaseosa", 10.0, 4.0);

    store.fail_nth_write("app_movements", 1);

    let outcome = ledger.quick_sale(item_id, 1.0, None).await.unwrap();
    assert_eq!(outcome.remaining, 9.0);
    assert!(store.rows("app_movements").is_empty());
}

// ========== Quick sale, deletion, bulk prices ==========

#[tokio::test]
async fn test_quick_sale_depletes_at_exactly_zero() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Jugo", 2.0, 3.5);

    let outcome = ledger.quick_sale(item_id, 2.0, None).await.unwrap();
    assert_eq!(outcome.remaining, 0.0);
    assert_eq!(outcome.total, 7.0);
    assert_eq!(store.rows("stock_items")[0]["status"], "DEPLETED");

    let err = ledger.quick_sale(item_id, 1.0, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock { .. }));
}

#[tokio::test]
async fn test_delete_item_cascades_to_formats() {
    let (store, ledger) = ledger();
    let item_id = seed_item(&store, "Vino", 6.0, 20.0);
    store.seed(
        "stock_item_formats",
        vec![json!({"stock_item_id": item_id, "pack_size": 6, "pack_price": 110.0})],
    );

    ledger.delete_item(item_id).await.unwrap();
    assert!(store.rows("stock_items").is_empty());
    assert!(store.rows("stock_item_formats").is_empty());
}

#[tokio::test]
async fn test_bulk_price_update_scales_items_and_formats() {
    let (store, ledger) = ledger();
    store.seed(
        "stock_items",
        vec![json!({
            "name": "Cerveza", "brand": "Quilmes", "quantity": 10.0,
            "initial_quantity": 10.0, "cost_amount": 0.0, "unit_cost": 5.0,
            "selling_price": 10.0, "pack_price": 55.0,
            "is_pack": true, "pack_size": 6, "status": "AVAILABLE",
        })],
    );
    store.seed(
        "stock_item_formats",
        vec![json!({"stock_item_id": 1, "pack_size": 12, "pack_price": 100.0})],
    );

    let updated = ledger
        .bulk_update_prices(BulkPriceUpdate {
            percentage: 10.0,
            category_id: None,
            brand: Some("quilmes".into()),
        })
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let item = &store.rows("stock_items")[0];
    assert_eq!(item["selling_price"], 11.0);
    assert_eq!(item["unit_cost"], 5.5);
    assert_eq!(item["pack_price"], 60.5);
    assert_eq!(store.rows("stock_item_formats")[0]["pack_price"], 110.0);
}

#[tokio::test]
async fn test_bulk_price_update_with_no_matches_is_not_found() {
    let (_store, ledger) = ledger();
    let err = ledger
        .bulk_update_prices(BulkPriceUpdate {
            percentage: 5.0,
            category_id: Some(99),
            brand: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

// ========== Listings, entries, summary ==========

#[tokio::test]
async fn test_list_stock_embeds_formats() {
    let (store, ledger) = ledger();
    let a = seed_item(&store, "Agua", 5.0, 2.0);
    let b = seed_item(&store, "Cerveza", 5.0, 3.0);
    store.seed(
        "stock_item_formats",
        vec![json!({"stock_item_id": b, "pack_size": 6, "pack_price": 16.0})],
    );

    let listing = ledger.list_stock().await.unwrap();
    assert_eq!(listing.len(), 2);
    // Ordered by name: Agua first
    assert_eq!(listing[0].item.id, a);
    assert!(listing[0].formats.is_empty());
    assert_eq!(listing[1].formats.len(), 1);
}

#[tokio::test]
async fn test_manual_entry_and_pagination() {
    let (store, ledger) = ledger();
    ledger
        .categories()
        .create(shared::models::CategoryCreate::new(
            "Gastos Fijos",
            shared::models::CategoryType::Expense,
        ))
        .await
        .unwrap();

    for i in 0..5 {
        ledger
            .create_entry(LedgerEntryCreate {
                amount: 10.0 + f64::from(i),
                description: format!("alquiler {i}"),
                kind: shared::models::EntryType::Expense,
                category_id: 1,
            })
            .await
            .unwrap();
    }
    assert_eq!(store.rows("transactions").len(), 5);

    let page = ledger.list_entries(0, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    let rest = ledger.list_entries(2, 10).await.unwrap();
    assert_eq!(rest.len(), 3);
}

#[tokio::test]
async fn test_monthly_summary_windows_by_date() {
    let (store, ledger) = ledger();
    store.seed(
        "transactions",
        vec![
            json!({"amount": 100.0, "type": "INCOME", "category_id": 1,
                   "description": "in-month", "date": "2026-08-10T12:00:00Z"}),
            json!({"amount": 40.0, "type": "EXPENSE", "category_id": 2,
                   "description": "in-month", "date": "2026-08-20T09:00:00Z"}),
            json!({"amount": 999.0, "type": "INCOME", "category_id": 1,
                   "description": "out-of-month", "date": "2026-07-31T23:59:00Z"}),
        ],
    );
    store.seed(
        "app_movements",
        vec![
            json!({"category": "sale", "action": "batch_sale", "description": "v1",
                   "metadata": {}, "created_at": "2026-08-01T10:00:00Z"}),
            json!({"category": "stock", "action": "replenished", "description": "r1",
                   "metadata": {}, "created_at": "2026-08-02T10:00:00Z"}),
        ],
    );

    let summary = ledger.monthly_summary(2026, 8).await.unwrap();
    assert_eq!(summary.total_income, 100.0);
    assert_eq!(summary.total_expense, 40.0);
    assert_eq!(summary.net_balance, 60.0);
    assert_eq!(summary.recent_sales.len(), 1);
}

#[tokio::test]
async fn test_category_seed_is_idempotent() {
    let (store, ledger) = ledger();
    let added = ledger.seed_categories().await.unwrap();
    assert_eq!(added, 10);
    let again = ledger.seed_categories().await.unwrap();
    assert_eq!(again, 0);

    // One seed movement, not one per run
    assert_eq!(store.rows("app_movements").len(), 1);

    let id = ledger
        .categories()
        .require(abasto_ledger::BEVERAGE_SALES_CATEGORY)
        .await
        .unwrap();
    assert!(id > 0);
}
