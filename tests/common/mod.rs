//! Shared utilities for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use similar_products::config::ServiceConfig;
use similar_products::domain::{ProductDetail, ProductId};
use similar_products::lifecycle::{Application, Shutdown};
use similar_products::upstream::{UpstreamCallError, UpstreamClient, UpstreamResult};
use similar_products::AggregationPipeline;

pub const ADMIN_KEY: &str = "test-admin-key";

pub fn pid(raw: &str) -> ProductId {
    ProductId::new(raw).unwrap()
}

pub fn detail(id: &str, name: &str, price: f64, available: bool) -> ProductDetail {
    ProductDetail::new(pid(id), name, Some(price), available)
}

/// In-memory upstream with scripted replies and per-id call counters.
///
/// Unscripted roots answer `null`; unscripted details answer not-found.
#[derive(Default)]
pub struct ScriptedClient {
    similar: Mutex<HashMap<String, UpstreamResult<Option<Vec<ProductId>>>>>,
    details: Mutex<HashMap<String, UpstreamResult<Option<ProductDetail>>>>,
    detail_delays: Mutex<HashMap<String, Duration>>,
    similar_calls: Mutex<HashMap<String, usize>>,
    detail_calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_similar(self, root: &str, ids: &[&str]) -> Self {
        self.set_similar(root, Ok(Some(ids.iter().map(|id| pid(id)).collect())));
        self
    }

    pub fn with_detail(self, detail: ProductDetail) -> Self {
        let id = detail.id.to_string();
        self.set_detail(&id, Ok(Some(detail)));
        self
    }

    pub fn set_similar(&self, root: &str, reply: UpstreamResult<Option<Vec<ProductId>>>) {
        self.similar.lock().insert(root.to_string(), reply);
    }

    pub fn set_detail(&self, id: &str, reply: UpstreamResult<Option<ProductDetail>>) {
        self.details.lock().insert(id.to_string(), reply);
    }

    pub fn set_detail_delay(&self, id: &str, delay: Duration) {
        self.detail_delays.lock().insert(id.to_string(), delay);
    }

    pub fn similar_calls(&self, root: &str) -> usize {
        self.similar_calls.lock().get(root).copied().unwrap_or(0)
    }

    pub fn detail_calls(&self, id: &str) -> usize {
        self.detail_calls.lock().get(id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.similar_calls.lock().values().sum::<usize>() + self.detail_calls.lock().values().sum::<usize>()
    }
}

#[async_trait]
impl UpstreamClient for ScriptedClient {
    async fn similar_ids(&self, id: &ProductId) -> UpstreamResult<Option<Vec<ProductId>>> {
        *self.similar_calls.lock().entry(id.to_string()).or_default() += 1;
        self.similar.lock().get(id.as_str()).cloned().unwrap_or(Ok(None))
    }

    async fn details_by_id(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>> {
        *self.detail_calls.lock().entry(id.to_string()).or_default() += 1;
        let delay = self.detail_delays.lock().get(id.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.details
            .lock()
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| Err(UpstreamCallError::NotFound { resource: id.to_string() }))
    }
}

/// Programmable catalog service speaking real HTTP.
#[derive(Clone, Default)]
pub struct MockCatalog {
    routes: Arc<Mutex<HashMap<String, MockReply>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

#[derive(Clone)]
struct MockReply {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        self.insert(path, status, body.into(), None);
    }

    pub fn respond_slow(&self, path: &str, status: u16, body: impl Into<String>, delay: Duration) {
        self.insert(path, status, body.into(), Some(delay));
    }

    fn insert(&self, path: &str, status: u16, body: String, delay: Option<Duration>) {
        self.routes
            .lock()
            .insert(path.to_string(), MockReply { status, body, delay });
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().get(path).copied().unwrap_or(0)
    }

    /// Serve on an ephemeral port. Unscripted paths answer 404.
    pub async fn start(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(mock_handler).with_state(self.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }
}

async fn mock_handler(State(catalog): State<MockCatalog>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *catalog.hits.lock().entry(path.clone()).or_default() += 1;

    let reply = catalog.routes.lock().get(&path).cloned();
    match reply {
        Some(reply) => {
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            let status = StatusCode::from_u16(reply.status).unwrap();
            (status, [(CONTENT_TYPE, "application/json")], reply.body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Config pointing at `upstream`, with admin routes on and the exporter off.
pub fn test_config(upstream: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.read_timeout_ms = 1000;
    config.observability.metrics_enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// A running service instance.
pub struct TestService {
    pub addr: SocketAddr,
    pub pipeline: AggregationPipeline,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<()>,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start `app` on an ephemeral port.
pub async fn spawn_app(app: Application) -> TestService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let pipeline = app.pipeline().clone();
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        let _ = app.run(listener, server_shutdown).await;
    });

    TestService {
        addr,
        pipeline,
        shutdown,
        handle,
    }
}

/// Non-pooled client so tests never reuse a connection across servers.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
