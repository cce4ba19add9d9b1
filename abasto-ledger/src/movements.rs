//! Movement audit logger
//!
//! Fire-and-forget side channel: a failed audit write is logged and
//! swallowed, never propagated to the operation that triggered it.

use abasto_client::StoreClient;
use chrono::Utc;
use serde_json::{Value, json};
use shared::models::{MovementAction, MovementCategory, MovementRefs};

pub const MOVEMENTS_TABLE: &str = "app_movements";

/// Append-only recorder of business events
#[derive(Clone)]
pub struct MovementLog {
    client: StoreClient,
}

impl MovementLog {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Record one movement. Never fails from the caller's point of view.
    pub async fn record(
        &self,
        category: MovementCategory,
        action: MovementAction,
        description: impl Into<String>,
        metadata: Value,
        refs: MovementRefs,
    ) {
        let description = description.into();
        let row = json!({
            "category": category,
            "action": action,
            "description": description,
            "metadata": metadata,
            "created_at": Utc::now(),
            "stock_item_id": refs.stock_item_id,
            "transaction_id": refs.transaction_id,
            "sale_id": refs.sale_id,
        });

        let outcome = self
            .client
            .table(MOVEMENTS_TABLE)
            .insert(row)
            .execute()
            .await
            .and_then(|resp| resp.into_result());

        if let Err(err) = outcome {
            tracing::warn!(%err, %description, "audit movement write failed, continuing");
        }
    }
}
