//! Store client: configuration, auth headers and builder entry point

use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::executor::{Executor, HttpTransport, RouterTransport, Transport};
use crate::query::QueryBuilder;

// ========== Configuration ==========

/// Connection settings for the REST data store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `https://store.example.com`
    pub url: String,
    /// Service key, sent as both `apikey` and bearer token
    pub key: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_idle_connections: usize,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            max_idle_connections: 10,
        }
    }

    /// Load from environment, honoring a local `.env` file
    ///
    /// Missing credentials are fatal at construction rather than at the
    /// first request.
    pub fn from_env() -> StoreResult<Self> {
        dotenv::dotenv().ok();

        let url = std::env::var("ABASTO_STORE_URL")
            .map_err(|_| StoreError::Unconfigured("ABASTO_STORE_URL is not set".into()))?;
        let key = std::env::var("ABASTO_STORE_KEY")
            .map_err(|_| StoreError::Unconfigured("ABASTO_STORE_KEY is not set".into()))?;

        if url.trim().is_empty() {
            return Err(StoreError::Unconfigured("ABASTO_STORE_URL is empty".into()));
        }
        if key.trim().is_empty() {
            return Err(StoreError::Unconfigured("ABASTO_STORE_KEY is empty".into()));
        }

        Ok(Self::new(url, key))
    }
}

// ========== Client ==========

/// Handle over one store endpoint
///
/// Cheap to clone; every clone shares the same pooled transport. Request
/// composition starts at [`table`](Self::table), which hands out a fresh
/// single-use [`QueryBuilder`] seeded with the client's auth headers.
#[derive(Clone)]
pub struct StoreClient {
    executor: Executor,
    headers: Vec<(String, String)>,
}

impl StoreClient {
    /// Network client over a pooled HTTP transport
    pub fn new(config: StoreConfig) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config));
        Self {
            executor: Executor::new(transport),
            headers: auth_headers(&config.key),
        }
    }

    /// Network client configured from the environment
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self::new(StoreConfig::from_env()?))
    }

    /// In-process client over an axum router, no sockets involved
    pub fn in_process(router: axum::Router, key: &str) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(RouterTransport::new(router));
        Self {
            executor: Executor::new(transport),
            headers: auth_headers(key),
        }
    }

    /// Client over a caller-supplied transport
    pub fn with_transport(transport: Arc<dyn Transport>, key: &str) -> Self {
        Self {
            executor: Executor::new(transport),
            headers: auth_headers(key),
        }
    }

    /// Start a query against one table
    pub fn table(&self, name: &str) -> QueryBuilder {
        QueryBuilder::new(self.executor.clone(), &self.headers, name)
    }

    /// Eagerly open the transport; otherwise it opens on first use
    pub async fn open(&self) -> StoreResult<()> {
        self.executor.open().await
    }

    /// Release pooled connections. Idempotent; a later request reopens.
    pub async fn close(&self) {
        self.executor.close().await;
    }
}

fn auth_headers(key: &str) -> Vec<(String, String)> {
    vec![
        ("apikey".to_string(), key.to_string()),
        ("Authorization".to_string(), format!("Bearer {key}")),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}
