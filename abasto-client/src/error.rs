//! Store client error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error payload returned by the store on a failed request
///
/// Parsed from the JSON error body when possible; plain-text bodies are
/// preserved verbatim in `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ErrorPayload {
    /// Parse a failure body, falling back to the raw text
    pub fn from_body(status: u16, body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: if body.is_empty() {
                format!("store returned status {status}")
            } else {
                body.to_string()
            },
            code: Some(status.to_string()),
            details: None,
            hint: None,
        })
    }
}

/// Client error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store endpoint is not configured (fatal, raised at construction)
    #[error("store endpoint is not configured: {0}")]
    Unconfigured(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the store, payload preserved for diagnostics
    #[error("store error ({status}): {}", payload.message)]
    Upstream { status: u16, payload: ErrorPayload },

    /// The query was assembled incorrectly by the caller
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Response body could not be decoded into the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// In-process transport failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn upstream(status: u16, payload: ErrorPayload) -> Self {
        Self::Upstream { status, payload }
    }

    /// Status code of an upstream failure, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
