//! Category directory with an injectable name→id cache
//!
//! The cache is explicit state owned by the directory, cleared whenever a
//! category is created or the defaults are seeded, so a freshly created
//! category is always resolvable.

use abasto_client::{SortDir, StoreClient};
use dashmap::DashMap;
use serde_json::json;
use shared::models::{Category, CategoryCreate, CategoryType};

use crate::error::{LedgerError, LedgerResult};

pub const CATEGORIES_TABLE: &str = "categories";

/// Expense category credited on purchase intake and replenishment
pub const MERCH_PURCHASE_CATEGORY: &str = "Compra de Mercadería";
/// Income category credited on every sale
pub const BEVERAGE_SALES_CATEGORY: &str = "Venta de Bebidas";

/// Default catalog seeded on first boot
pub fn default_categories() -> Vec<CategoryCreate> {
    use CategoryType::*;
    [
        ("Gaseosas", Product),
        ("Cervezas", Product),
        ("Vinos y Espumantes", Product),
        ("Aguas y Jugos", Product),
        ("Destilados", Product),
        ("Comida / Snacks", Product),
        (BEVERAGE_SALES_CATEGORY, Income),
        (MERCH_PURCHASE_CATEGORY, Expense),
        ("Gastos Fijos", Expense),
        ("Otros Ingresos", Income),
    ]
    .into_iter()
    .map(|(name, kind)| CategoryCreate::new(name, kind))
    .collect()
}

/// Name→id cache, shared between directory clones
#[derive(Clone, Default)]
pub struct CategoryCache {
    map: std::sync::Arc<DashMap<String, i64>>,
}

impl CategoryCache {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.map.get(name).map(|entry| *entry)
    }

    pub fn put(&self, name: &str, id: i64) {
        self.map.insert(name.to_string(), id);
    }

    pub fn clear(&self) {
        self.map.clear();
    }
}

/// Lookup and lifecycle for categories
#[derive(Clone)]
pub struct CategoryDirectory {
    client: StoreClient,
    cache: CategoryCache,
}

impl CategoryDirectory {
    pub fn new(client: StoreClient, cache: CategoryCache) -> Self {
        Self { client, cache }
    }

    /// Resolve a category id by name, consulting the cache first
    pub async fn resolve(&self, name: &str) -> LedgerResult<Option<i64>> {
        if let Some(id) = self.cache.get(name) {
            return Ok(Some(id));
        }

        let found: Option<Category> = self
            .client
            .table(CATEGORIES_TABLE)
            .select("*")
            .eq("name", name)
            .single()
            .execute()
            .await?
            .single()?;

        if let Some(category) = &found {
            self.cache.put(name, category.id);
        }
        Ok(found.map(|c| c.id))
    }

    /// Resolve a category id, failing with `NotFound` when absent
    pub async fn require(&self, name: &str) -> LedgerResult<i64> {
        self.resolve(name)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("category '{name}'")))
    }

    /// Resolve a category, creating it when absent
    pub async fn ensure(&self, name: &str, kind: CategoryType) -> LedgerResult<i64> {
        if let Some(id) = self.resolve(name).await? {
            return Ok(id);
        }
        let created = self.create(CategoryCreate::new(name, kind)).await?;
        Ok(created.id)
    }

    /// Create one category; invalidates the cache
    pub async fn create(&self, category: CategoryCreate) -> LedgerResult<Category> {
        let created: Category = self
            .client
            .table(CATEGORIES_TABLE)
            .insert(json!(category))
            .execute()
            .await?
            .first()?
            .ok_or_else(|| {
                LedgerError::invalid("category insert returned no representation")
            })?;

        self.cache.clear();
        self.cache.put(&created.name, created.id);
        Ok(created)
    }

    /// Insert any missing default categories; returns how many were added
    pub async fn seed_defaults(&self) -> LedgerResult<usize> {
        let existing = self.list().await?;
        let mut added = 0;
        for wanted in default_categories() {
            if existing.iter().any(|c| c.name == wanted.name) {
                continue;
            }
            self.client
                .table(CATEGORIES_TABLE)
                .insert(json!(wanted))
                .execute()
                .await?
                .into_result()?;
            added += 1;
        }
        if added > 0 {
            self.cache.clear();
            tracing::info!(added, "seeded default categories");
        }
        Ok(added)
    }

    pub async fn list(&self) -> LedgerResult<Vec<Category>> {
        Ok(self
            .client
            .table(CATEGORIES_TABLE)
            .select("*")
            .order("name", SortDir::Asc)
            .execute()
            .await?
            .rows()?)
    }
}
