use crate::application::ports::{HttpTransport, OutboundRequest};
use crate::application::services::ConnectivityMonitor;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Polls the API health endpoint and feeds the result into the monitor.
/// Any HTTP response counts as reachable.
pub struct HealthCheck {
    transport: Arc<dyn HttpTransport>,
    monitor: ConnectivityMonitor,
    url: String,
    interval: Duration,
}

impl HealthCheck {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        monitor: ConnectivityMonitor,
        url: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            transport,
            monitor,
            url: url.into(),
            interval,
        }
    }

    pub async fn check_once(&self) -> bool {
        let request = OutboundRequest::new(Method::GET, self.url.clone());
        let reachable = match self.transport.send(&request).await {
            Ok(response) => {
                tracing::trace!(
                    target: "field_sync::connectivity",
                    status = response.status,
                    "health check answered"
                );
                true
            }
            Err(err) => {
                tracing::debug!(
                    target: "field_sync::connectivity",
                    error = %err,
                    "health check failed"
                );
                false
            }
        };
        self.monitor.set_online(reachable);
        reachable
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.check_once().await;
                    }
                }
            }
            tracing::debug!(target: "field_sync::connectivity", "health check stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ToggleTransport {
        up: AtomicBool,
    }

    #[async_trait]
    impl HttpTransport for ToggleTransport {
        async fn send(
            &self,
            _request: &OutboundRequest,
        ) -> Result<TransportResponse, TransportError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(TransportResponse {
                    status: 503,
                    headers: Vec::new(),
                    body: Bytes::new(),
                })
            } else {
                Err(TransportError::Network("connection refused".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn check_updates_monitor() {
        let transport = Arc::new(ToggleTransport {
            up: AtomicBool::new(false),
        });
        let monitor = ConnectivityMonitor::new(true);
        let checker = HealthCheck::new(
            transport.clone(),
            monitor.clone(),
            "http://api/health",
            Duration::from_secs(30),
        );

        assert!(!checker.check_once().await);
        assert!(!monitor.is_online());

        transport.up.store(true, Ordering::SeqCst);
        assert!(checker.check_once().await);
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn spawned_check_stops_on_shutdown() {
        let transport = Arc::new(ToggleTransport {
            up: AtomicBool::new(false),
        });
        let monitor = ConnectivityMonitor::new(true);
        let mut sub = monitor.subscribe();
        let shutdown = CancellationToken::new();
        let handle = HealthCheck::new(
            transport,
            monitor.clone(),
            "http://api/health",
            Duration::from_millis(10),
        )
        .spawn(shutdown.clone());

        assert_eq!(sub.next().await, Some(false));
        shutdown.cancel();
        handle.await.unwrap();
    }
}
