pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

#[cfg(test)]
mod test_support;

pub use application::services::{
    ConnectivityMonitor, FetchOutcome, InterceptedRequest, InterceptedResponse, RecordService,
    ReconcileOutcome, RequestInterceptor, SaveOutcome, SyncDriver, SyncReconciler, SyncStatus,
};
pub use domain::entities::{FieldRecord, QueuedMutation, SyncReport, SyncTrigger};
pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "field_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
