//! Shared types for the Abasto inventory platform
//!
//! Domain models and payload types used by both the store client
//! and the ledger engine.

pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};
