//! Request executor: transport lifecycle and response normalization
//!
//! One HTTP request per finalized query. Two transports share the
//! [`Transport`] seam: a pooled reqwest client for the network, and an
//! in-process axum router driven through `tower::ServiceExt::oneshot`
//! (zero network overhead, used by tests and embedded deployments).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::client::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::response::StoreResponse;

/// Path prefix for table resources
const REST_PREFIX: &str = "/rest/v1";

/// One finalized wire request
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub table: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Single-row mode, drives envelope normalization
    pub single: bool,
}

impl WireRequest {
    pub fn path(&self) -> String {
        format!("{REST_PREFIX}/{}", self.table)
    }
}

/// Raw transport result before envelope normalization
#[derive(Debug)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

/// Transport seam: network client or in-process router
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: &WireRequest) -> StoreResult<WireResponse>;

    /// Eagerly open the underlying connection pool (optional)
    async fn open(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Release pooled connections; in-flight requests finish undisturbed
    async fn close(&self) {}
}

// ============================================================================
// HttpTransport - pooled network transport
// ============================================================================

/// Pooled reqwest transport with lazy open and idempotent close
///
/// The inner client is created on first use and recreated transparently
/// after `close()`. Cloned handles held by in-flight requests keep the
/// pool alive until they complete, so closing never breaks them.
pub struct HttpTransport {
    base_url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    max_idle_connections: usize,
    client: RwLock<Option<reqwest::Client>>,
}

impl HttpTransport {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_idle_connections: config.max_idle_connections,
            client: RwLock::new(None),
        }
    }

    /// Get the pooled client, building it on first use or after a close
    async fn client(&self) -> StoreResult<reqwest::Client> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut guard = self.client.write().await;
        // Another caller may have opened it while we waited for the lock
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .pool_max_idle_per_host(self.max_idle_connections)
            .build()?;
        *guard = Some(client.clone());
        tracing::debug!(base_url = %self.base_url, "store transport opened");
        Ok(client)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: &WireRequest) -> StoreResult<WireResponse> {
        let client = self.client().await?;
        let url = format!("{}{}", self.base_url, req.path());

        let mut builder = client.request(req.method.clone(), &url).query(&req.params);
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(WireResponse { status, body })
    }

    async fn open(&self) -> StoreResult<()> {
        self.client().await.map(|_| ())
    }

    async fn close(&self) {
        let mut guard = self.client.write().await;
        if guard.take().is_some() {
            tracing::debug!(base_url = %self.base_url, "store transport closed");
        }
    }
}

// ============================================================================
// RouterTransport - in-process transport (tower oneshot)
// ============================================================================

/// In-process transport that drives an axum router directly
#[derive(Clone)]
pub struct RouterTransport {
    router: axum::Router,
}

impl RouterTransport {
    pub fn new(router: axum::Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Transport for RouterTransport {
    async fn send(&self, req: &WireRequest) -> StoreResult<WireResponse> {
        use axum::body::Body;
        use tower::ServiceExt;

        let query = serde_urlencoded::to_string(&req.params)
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let uri = if query.is_empty() {
            req.path()
        } else {
            format!("{}?{}", req.path(), query)
        };

        let mut builder = http::Request::builder().method(req.method.clone()).uri(uri);
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        let body = match &req.body {
            Some(value) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(value)?)
            }
            None => Body::empty(),
        };

        let request = builder
            .body(body)
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        let resp = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        let status = resp.status().as_u16();
        let bytes = axum::body::to_bytes(resp.into_body(), 4 * 1024 * 1024)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        Ok(WireResponse {
            status,
            body: String::from_utf8_lossy(&bytes).to_string(),
        })
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Owns a transport and normalizes raw responses into envelopes
///
/// No automatic retries: idempotent GETs may be retried by callers, but
/// retry/backoff policy lives above this layer.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue one request and fold the result into a uniform envelope
    pub async fn execute(&self, req: WireRequest) -> StoreResult<StoreResponse> {
        let wire = self.transport.send(&req).await?;
        Ok(StoreResponse::from_wire(wire.status, &wire.body, req.single))
    }

    pub async fn open(&self) -> StoreResult<()> {
        self.transport.open().await
    }

    pub async fn close(&self) {
        self.transport.close().await;
    }
}
