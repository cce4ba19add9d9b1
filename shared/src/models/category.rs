//! Category model

use serde::{Deserialize, Serialize};

/// What a category classifies: products, income entries or expense entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Product,
    Income,
    Expense,
}

/// Category entity
///
/// Names are unique in the store. Categories are created once and rarely
/// mutated; the engine never cascade-deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
}

impl CategoryCreate {
    pub fn new(name: impl Into<String>, kind: CategoryType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
