use crate::application::ports::{
    HttpTransport, MutationQueue, OutboundRequest, ResponseCache, TransportError,
    TransportResponse,
};
use crate::application::services::ConnectivityMonitor;
use crate::domain::entities::{CacheEntry, FieldRecord, MutationDraft};
use crate::domain::value_objects::{CacheKind, CacheNamespace, MutationMethod, MutationPayload};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use bytes::Bytes;
use futures::future::join_all;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const OFFLINE_READ_MESSAGE: &str =
    "You are offline. Data will sync when connection is restored.";
pub const OFFLINE_WRITE_MESSAGE: &str =
    "Data saved offline. Will sync when connection is restored.";

const CONTENT_TYPE: &str = "content-type";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A top-level page load; may fall back to the cached app shell.
    Navigate,
    Other,
}

#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub mode: RequestMode,
    pub cancel: Option<CancellationToken>,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            mode: RequestMode::Other,
            cancel: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        let mut request = Self::get(url);
        request.mode = RequestMode::Navigate;
        request
    }

    pub fn json<T: Serialize>(
        method: Method,
        url: impl Into<String>,
        body: &T,
    ) -> Result<Self, AppError> {
        let mut request = Self::new(method, url);
        request.body = Some(Bytes::from(serde_json::to_vec(body)?));
        request
            .headers
            .push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        Ok(request)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// A write diverted to the durable queue.
    Queued,
    /// Synthesized because neither network nor cache could answer.
    Offline,
}

#[derive(Debug, Clone)]
pub struct InterceptedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl InterceptedResponse {
    fn from_transport(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
            source: ResponseSource::Network,
        }
    }

    fn from_cache(entry: CacheEntry) -> Self {
        Self {
            status: entry.status,
            headers: entry.headers,
            body: entry.body,
            source: ResponseSource::Cache,
        }
    }

    fn synthesized_json(value: &Value, source: ResponseSource) -> Self {
        Self {
            status: 200,
            headers: vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())],
            body: Bytes::from(value.to_string()),
            source,
        }
    }

    fn offline_page() -> Self {
        Self {
            status: 200,
            headers: vec![(CONTENT_TYPE.to_string(), "text/plain".to_string())],
            body: Bytes::from_static(b"Offline"),
            source: ResponseSource::Offline,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the answer did not come live from the network.
    pub fn is_offline(&self) -> bool {
        self.source != ResponseSource::Network
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::DeserializationError(format!("Invalid response body: {e}")))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestClass {
    Static,
    ApiRead,
    QueueableWrite(MutationMethod),
    ApiOther,
}

enum Attempt {
    Response(TransportResponse),
    Failed(TransportError),
    Aborted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies the cache/queue policy to every request before it reaches the network.
pub struct RequestInterceptor {
    transport: Arc<dyn HttpTransport>,
    queue: Arc<dyn MutationQueue>,
    cache: Arc<dyn ResponseCache>,
    monitor: ConnectivityMonitor,
    api_base: String,
    records_url: String,
    shell_url: String,
    precache_urls: Vec<String>,
    static_namespace: CacheNamespace,
    api_namespace: CacheNamespace,
    timeout: Duration,
}

impl RequestInterceptor {
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
        queue: Arc<dyn MutationQueue>,
        cache: Arc<dyn ResponseCache>,
        monitor: ConnectivityMonitor,
    ) -> Result<Self, AppError> {
        let static_namespace =
            CacheNamespace::new(&config.cache.name_prefix, CacheKind::Static, &config.cache.version)
                .map_err(AppError::ConfigurationError)?;
        let api_namespace =
            CacheNamespace::new(&config.cache.name_prefix, CacheKind::Api, &config.cache.version)
                .map_err(AppError::ConfigurationError)?;

        Ok(Self {
            transport,
            queue,
            cache,
            monitor,
            api_base: config.api.base_url.trim_end_matches('/').to_string(),
            records_url: config.api.records_url(),
            shell_url: config.cache.shell_url(),
            precache_urls: config.cache.precache_urls(),
            static_namespace,
            api_namespace,
            timeout: Duration::from_millis(config.api.request_timeout_ms),
        })
    }

    pub fn records_url(&self) -> &str {
        &self.records_url
    }

    pub fn static_namespace(&self) -> &CacheNamespace {
        &self.static_namespace
    }

    pub fn api_namespace(&self) -> &CacheNamespace {
        &self.api_namespace
    }

    pub async fn handle(
        &self,
        request: InterceptedRequest,
    ) -> Result<InterceptedResponse, AppError> {
        if request.is_cancelled() {
            return Err(AppError::Aborted);
        }

        let class = self.classify(&request);
        tracing::trace!(
            target: "field_sync::interceptor",
            method = %request.method,
            url = %request.url,
            ?class,
            "intercepting request"
        );

        match class {
            RequestClass::Static => self.handle_static(request).await,
            RequestClass::ApiRead => self.handle_read(request).await,
            RequestClass::QueueableWrite(method) => self.handle_write(request, method).await,
            RequestClass::ApiOther => self.handle_passthrough(request).await,
        }
    }

    /// Precaches the app shell into the static namespace.
    pub async fn install(&self) -> InstallReport {
        let attempts = self.precache_urls.iter().map(|url| async move {
            let request = InterceptedRequest::get(url.clone());
            let outcome = match self.attempt(&request).await {
                Attempt::Response(response) if response.is_success() => {
                    self.store(&self.static_namespace, url, response).await
                }
                Attempt::Response(response) => Err(format!("HTTP {}", response.status)),
                Attempt::Failed(err) => Err(err.to_string()),
                Attempt::Aborted => Err("aborted".to_string()),
            };
            (url.clone(), outcome)
        });

        let mut report = InstallReport::default();
        for (url, outcome) in join_all(attempts).await {
            match outcome {
                Ok(()) => report.cached.push(url),
                Err(reason) => report.failed.push((url, reason)),
            }
        }

        if report.is_complete() {
            tracing::info!(
                target: "field_sync::cache",
                cached = report.cached.len(),
                "precache complete"
            );
        } else {
            tracing::warn!(
                target: "field_sync::cache",
                cached = report.cached.len(),
                failed = report.failed.len(),
                "precache incomplete"
            );
        }
        report
    }

    /// Purges every cache namespace other than the current static and API ones.
    pub async fn activate(&self) -> Result<Vec<CacheNamespace>, AppError> {
        let mut purged = Vec::new();
        for namespace in self.cache.namespaces().await? {
            if namespace == self.static_namespace || namespace == self.api_namespace {
                continue;
            }
            let removed = self.cache.purge_namespace(&namespace).await?;
            tracing::info!(
                target: "field_sync::cache",
                namespace = %namespace,
                removed,
                "purged stale cache namespace"
            );
            purged.push(namespace);
        }
        Ok(purged)
    }

    fn classify(&self, request: &InterceptedRequest) -> RequestClass {
        if !self.is_api_url(&request.url) {
            return RequestClass::Static;
        }
        if request.method == Method::GET || request.method == Method::HEAD {
            return RequestClass::ApiRead;
        }
        match MutationMethod::from_http(&request.method) {
            Some(method) if self.is_records_url(&request.url) => {
                RequestClass::QueueableWrite(method)
            }
            _ => RequestClass::ApiOther,
        }
    }

    fn is_api_url(&self, url: &str) -> bool {
        is_under(url, &self.api_base)
    }

    fn is_records_url(&self, url: &str) -> bool {
        is_under(url, &self.records_url)
    }

    async fn handle_read(
        &self,
        request: InterceptedRequest,
    ) -> Result<InterceptedResponse, AppError> {
        match self.attempt(&request).await {
            Attempt::Response(response) => {
                if response.is_success() && request.method == Method::GET {
                    if let Err(reason) = self
                        .store(&self.api_namespace, &request.url, response.clone())
                        .await
                    {
                        tracing::warn!(
                            target: "field_sync::cache",
                            url = %request.url,
                            %reason,
                            "failed to cache read"
                        );
                    }
                }
                Ok(InterceptedResponse::from_transport(response))
            }
            Attempt::Failed(err) => {
                tracing::debug!(
                    target: "field_sync::interceptor",
                    url = %request.url,
                    error = %err,
                    "read failed, trying cache"
                );
                if let Some(entry) = self.cached(&self.api_namespace, &request.url).await {
                    return Ok(InterceptedResponse::from_cache(entry));
                }
                Ok(InterceptedResponse::synthesized_json(
                    &json!({
                        "error": "Offline",
                        "message": OFFLINE_READ_MESSAGE,
                        "offline": true,
                    }),
                    ResponseSource::Offline,
                ))
            }
            Attempt::Aborted => Err(AppError::Aborted),
        }
    }

    async fn handle_write(
        &self,
        request: InterceptedRequest,
        method: MutationMethod,
    ) -> Result<InterceptedResponse, AppError> {
        let err = match self.attempt(&request).await {
            Attempt::Response(response) => return Ok(InterceptedResponse::from_transport(response)),
            Attempt::Failed(err) => err,
            Attempt::Aborted => return Err(AppError::Aborted),
        };
        if request.is_cancelled() {
            return Err(AppError::Aborted);
        }

        let payload = queued_payload(method, request.body.as_ref())?;
        let draft = MutationDraft::new(request.url.clone(), method, payload)
            .map_err(AppError::ValidationError)?
            .with_headers(&request.headers);
        let queued = self.queue.enqueue(draft).await?;

        tracing::info!(
            target: "field_sync::interceptor",
            mutation_id = %queued.id,
            method = method.as_str(),
            url = %request.url,
            error = %err,
            "write queued for sync"
        );

        Ok(InterceptedResponse::synthesized_json(
            &json!({
                "success": true,
                "message": OFFLINE_WRITE_MESSAGE,
                "offline": true,
                "queuedId": queued.id.as_str(),
            }),
            ResponseSource::Queued,
        ))
    }

    async fn handle_passthrough(
        &self,
        request: InterceptedRequest,
    ) -> Result<InterceptedResponse, AppError> {
        match self.attempt(&request).await {
            Attempt::Response(response) => Ok(InterceptedResponse::from_transport(response)),
            Attempt::Failed(err) => Err(unreachable_error(err)),
            Attempt::Aborted => Err(AppError::Aborted),
        }
    }

    async fn handle_static(
        &self,
        request: InterceptedRequest,
    ) -> Result<InterceptedResponse, AppError> {
        let is_get = request.method == Method::GET;
        if is_get {
            if let Some(entry) = self.cached(&self.static_namespace, &request.url).await {
                return Ok(InterceptedResponse::from_cache(entry));
            }
        }

        match self.attempt(&request).await {
            Attempt::Response(response) => {
                if is_get && response.is_success() {
                    if let Err(reason) = self
                        .store(&self.static_namespace, &request.url, response.clone())
                        .await
                    {
                        tracing::warn!(
                            target: "field_sync::cache",
                            url = %request.url,
                            %reason,
                            "failed to cache asset"
                        );
                    }
                }
                Ok(InterceptedResponse::from_transport(response))
            }
            Attempt::Failed(err) if request.mode == RequestMode::Navigate => {
                tracing::debug!(
                    target: "field_sync::interceptor",
                    url = %request.url,
                    error = %err,
                    "navigation failed, serving shell"
                );
                let shell = self.cached(&self.static_namespace, &self.shell_url).await;
                match shell {
                    Some(shell) => Ok(InterceptedResponse::from_cache(shell)),
                    None => Ok(InterceptedResponse::offline_page()),
                }
            }
            Attempt::Failed(err) => Err(unreachable_error(err)),
            Attempt::Aborted => Err(AppError::Aborted),
        }
    }

    /// One bounded network attempt. Connectivity is updated from the outcome.
    async fn attempt(&self, request: &InterceptedRequest) -> Attempt {
        let outbound = OutboundRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        };
        let send = tokio::time::timeout(self.timeout, self.transport.send(&outbound));

        let result = match &request.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!(
                            target: "field_sync::interceptor",
                            url = %request.url,
                            "request aborted"
                        );
                        return Attempt::Aborted;
                    }
                    result = send => result,
                }
            }
            None => send.await,
        };

        match result {
            Ok(Ok(response)) => {
                self.monitor.set_online(true);
                Attempt::Response(response)
            }
            Ok(Err(err)) => {
                self.monitor.set_online(false);
                Attempt::Failed(err)
            }
            Err(_) => {
                self.monitor.set_online(false);
                Attempt::Failed(TransportError::Timeout)
            }
        }
    }

    async fn cached(&self, namespace: &CacheNamespace, url: &str) -> Option<CacheEntry> {
        match self.cache.get(namespace, url).await {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    target: "field_sync::cache",
                    %url,
                    error = %err,
                    "cache lookup failed"
                );
                None
            }
        }
    }

    async fn store(
        &self,
        namespace: &CacheNamespace,
        url: &str,
        response: TransportResponse,
    ) -> Result<(), String> {
        let entry = CacheEntry::new(
            namespace.clone(),
            url,
            response.status,
            response.headers,
            response.body,
        );
        self.cache.put(entry).await.map_err(|e| e.to_string())
    }
}

fn unreachable_error(err: TransportError) -> AppError {
    match err {
        TransportError::Timeout => AppError::Timeout(err.to_string()),
        TransportError::Network(message) => AppError::Network(message),
    }
}

fn is_under(url: &str, base: &str) -> bool {
    match url.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Validates a write body before it is allowed into the queue.
fn queued_payload(
    method: MutationMethod,
    body: Option<&Bytes>,
) -> Result<MutationPayload, AppError> {
    let body = body.filter(|bytes| !bytes.is_empty());
    let value = match body {
        Some(bytes) => serde_json::from_slice::<Value>(bytes)
            .map_err(|e| AppError::SerializationError(format!("Write body is not JSON: {e}")))?,
        None if method == MutationMethod::Delete => Value::Object(Default::default()),
        None => {
            return Err(AppError::ValidationError(format!(
                "{method} request has no body to queue"
            )));
        }
    };

    if method == MutationMethod::Post {
        FieldRecord::from_value(value.clone()).map_err(AppError::ValidationError)?;
    }
    MutationPayload::new(value).map_err(AppError::ValidationError)
}
