#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use field_sync::application::ports::{
    HttpTransport, OutboundRequest, TransportError, TransportResponse,
};
use field_sync::infrastructure::http::ReqwestTransport;
use field_sync::AppConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub idempotency_key: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct ApiState {
    received: Mutex<Vec<ReceivedRequest>>,
    records: Mutex<Vec<Value>>,
    next_id: AtomicU64,
}

impl ApiState {
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().expect("received lock").clone()
    }

    fn push(&self, method: &str, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let idempotency_key = header("idempotency-key");
        let authorization = header("authorization");
        self.received.lock().expect("received lock").push(ReceivedRequest {
            method: method.to_string(),
            path,
            body,
            idempotency_key,
            authorization,
        });
    }
}

pub struct MockApi {
    pub base_url: String,
    pub state: Arc<ApiState>,
    handle: JoinHandle<()>,
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Deserialize)]
struct RecordsQuery {
    #[serde(rename = "type")]
    record_type: Option<String>,
}

async fn create_record(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.push("POST", "/php/records".to_string(), &headers, body.clone());

    let has = |field: &str| {
        body.get(field)
            .and_then(Value::as_str)
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    };
    if !has("type") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Record type required"})));
    }
    if !has("location") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Location is required"})));
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let mut stored = body;
    stored["id"] = json!(id.to_string());
    state.records.lock().expect("records lock").push(stored);
    (StatusCode::OK, Json(json!({"success": true, "id": id.to_string()})))
}

async fn list_records(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<RecordsQuery>,
) -> Json<Value> {
    let records: Vec<Value> = state
        .records
        .lock()
        .expect("records lock")
        .iter()
        .filter(|record| match &query.record_type {
            Some(kind) => record.get("type").and_then(Value::as_str) == Some(kind.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    Json(json!({ "records": records }))
}

async fn update_record(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.push("PUT", format!("/php/records/{id}"), &headers, body);
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Record not found"})));
    }
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn delete_record(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    state.push("DELETE", format!("/php/records/{id}"), &headers, Value::Null);
    Json(json!({"success": true}))
}

pub async fn spawn_mock_api() -> MockApi {
    let state = Arc::new(ApiState::default());
    let app = Router::new()
        .route("/php/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/php/records", get(list_records).post(create_record))
        .route("/php/records/:id", put(update_record).delete(delete_record))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock records api");
    let addr = listener.local_addr().expect("mock records api addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("serve mock records api");
    });

    MockApi {
        base_url: format!("http://{addr}/php"),
        state,
        handle,
    }
}

/// Real HTTP transport with a switch that makes every request fail as if the
/// device lost its network.
pub struct SwitchableTransport {
    inner: ReqwestTransport,
    online: AtomicBool,
}

impl SwitchableTransport {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(Self {
            inner: ReqwestTransport::new(Duration::from_secs(5)).expect("build transport"),
            online: AtomicBool::new(online),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl HttpTransport for SwitchableTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(TransportError::Network("network is unreachable".to_string()));
        }
        self.inner.send(request).await
    }
}

pub fn test_config(base_url: &str, db_path: &FsPath) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.request_timeout_ms = 2_000;
    config.storage.database_url = format!("sqlite://{}?mode=rwc", db_path.display());
    config.storage.max_connections = 2;
    config.cache.app_origin = base_url.trim_end_matches("/php").to_string();
    config.connectivity.check_interval_secs = 0;
    config.sync.auto_sync = false;
    config
}

pub async fn wait_for<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
