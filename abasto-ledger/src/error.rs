//! Ledger engine error types

use abasto_client::StoreError;
use thiserror::Error;

/// Engine error taxonomy
///
/// `PartialCommitInconsistency` is the one condition that represents real
/// data drift: stock was deducted but the ledger writes failed and are
/// not compensated. It must never be masked as a generic failure.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced item, category or format is absent
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// A line's deduction exceeds the available quantity
    #[error("insufficient stock for {item}: available={available}, requested={requested}")]
    InsufficientStock {
        item: String,
        available: f64,
        requested: f64,
    },

    /// Quantity changed between pre-validation and commit
    #[error("stock changed concurrently for {item}: available={available}, requested={requested}")]
    ConcurrentModification {
        item: String,
        available: f64,
        requested: f64,
    },

    /// Store-side failure, payload preserved for diagnostics
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Stock already deducted, ledger/sale-line write failed afterwards.
    /// Not rolled back; requires manual reconciliation.
    #[error("partial commit: stock deducted but ledger write failed (transaction {transaction_id:?}): {detail}")]
    PartialCommitInconsistency {
        transaction_id: Option<i64>,
        detail: String,
    },

    /// The request itself is malformed (empty batch, unpriced item, ...)
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl LedgerError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn insufficient(item: impl Into<String>, available: f64, requested: f64) -> Self {
        Self::InsufficientStock {
            item: item.into(),
            available,
            requested,
        }
    }

    pub fn concurrent(item: impl Into<String>, available: f64, requested: f64) -> Self {
        Self::ConcurrentModification {
            item: item.into(),
            available,
            requested,
        }
    }

    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid(detail.into())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_item_and_quantities() {
        let err = LedgerError::insufficient("Quilmes 1L", 3.0, 5.0);
        let text = err.to_string();
        assert!(text.contains("Quilmes 1L"));
        assert!(text.contains("available=3"));
        assert!(text.contains("requested=5"));
    }

    #[test]
    fn test_partial_commit_is_distinct() {
        let err = LedgerError::PartialCommitInconsistency {
            transaction_id: Some(7),
            detail: "sale line insert failed".into(),
        };
        assert!(err.to_string().contains("partial commit"));
    }
}
