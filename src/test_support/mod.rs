//! Fakes shared by unit tests.

use crate::application::ports::{HttpTransport, OutboundRequest, TransportError, TransportResponse};
use crate::infrastructure::offline::{SqliteMutationQueue, SqliteResponseCache};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub async fn memory_store() -> (Arc<SqliteMutationQueue>, Arc<SqliteResponseCache>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    (
        Arc::new(SqliteMutationQueue::new(pool.clone())),
        Arc::new(SqliteResponseCache::new(pool)),
    )
}

/// Transport whose reachability, per-url status and body are set by the test.
pub struct FakeTransport {
    online: AtomicBool,
    hang: AtomicBool,
    statuses: Mutex<HashMap<String, u16>>,
    bodies: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<Vec<OutboundRequest>>,
    pause: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl FakeTransport {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(online),
            hang: AtomicBool::new(false),
            statuses: Mutex::new(HashMap::new()),
            bodies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            pause: Mutex::new(None),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Requests never complete while set.
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<Bytes>) {
        self.statuses.lock().unwrap().insert(url.to_string(), status);
        self.bodies.lock().unwrap().insert(url.to_string(), body.into());
    }

    /// The next request signals `entered`, then waits for `release`.
    pub fn pause_next(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.pause.lock().unwrap() = Some((entered.clone(), release.clone()));
        (entered, release)
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let pause = self.pause.lock().unwrap().take();
        if let Some((entered, release)) = pause {
            entered.notify_one();
            release.notified().await;
        }
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".to_string()));
        }

        let status = self
            .statuses
            .lock()
            .unwrap()
            .get(&request.url)
            .copied()
            .unwrap_or(200);
        let body = self
            .bodies
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Bytes::from_static(br#"{"success":true,"id":"1"}"#));

        Ok(TransportResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        })
    }
}
