use crate::application::ports::HttpTransport;
use crate::application::services::{
    BackgroundSyncHandle, ConnectivityMonitor, RecordService, RequestInterceptor, SyncDriver,
    SyncReconciler,
};
use crate::infrastructure::http::{HealthCheck, ReqwestTransport};
use crate::infrastructure::offline::OfflineStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Every service of the sync engine, wired once and shared by handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: OfflineStore,
    pub monitor: ConnectivityMonitor,
    pub transport: Arc<dyn HttpTransport>,
    pub interceptor: Arc<RequestInterceptor>,
    pub reconciler: Arc<SyncReconciler>,
    pub records: Arc<RecordService>,
}

pub struct BackgroundTasks {
    pub background_sync: BackgroundSyncHandle,
    pub handles: Vec<JoinHandle<()>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        let transport = Arc::new(ReqwestTransport::from_config(&config.api)?);
        Self::with_transport(config, transport).await
    }

    pub async fn with_transport(
        config: AppConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let store = OfflineStore::open(&config.storage).await;
        let monitor = ConnectivityMonitor::new(config.connectivity.assume_online);
        let interceptor = Arc::new(RequestInterceptor::new(
            &config,
            transport.clone(),
            store.queue.clone(),
            store.cache.clone(),
            monitor.clone(),
        )?);
        let reconciler = Arc::new(SyncReconciler::new(
            store.queue.clone(),
            transport.clone(),
            monitor.clone(),
            Duration::from_millis(config.api.request_timeout_ms),
            config.sync.stuck_after_attempts,
        ));
        let records = Arc::new(RecordService::new(
            interceptor.clone(),
            store.queue.clone(),
        ));

        tracing::info!(
            target: "field_sync::sync",
            api = %config.api.base_url,
            durable = store.is_durable(),
            "sync engine initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            monitor,
            transport,
            interceptor,
            reconciler,
            records,
        })
    }

    /// Starts the health check and the sync driver until `shutdown` fires.
    pub fn start_background(&self, shutdown: CancellationToken) -> BackgroundTasks {
        let mut handles = Vec::new();

        let check_secs = self.config.connectivity.check_interval_secs;
        if check_secs > 0 {
            let checker = HealthCheck::new(
                self.transport.clone(),
                self.monitor.clone(),
                self.config.api.health_url(),
                Duration::from_secs(check_secs),
            );
            handles.push(checker.spawn(shutdown.clone()));
        }

        let mut driver = SyncDriver::new(self.reconciler.clone(), &self.monitor);
        if self.config.sync.auto_sync && self.config.sync.interval_secs > 0 {
            driver = driver.with_interval(Duration::from_secs(self.config.sync.interval_secs));
        }
        let background_sync = driver.background_sync();
        handles.push(driver.spawn(shutdown));

        BackgroundTasks {
            background_sync,
            handles,
        }
    }
}
