pub mod connectivity;
pub mod interceptor;
pub mod reconciler;
pub mod record_service;
pub mod sync_driver;

pub use connectivity::{ConnectivityMonitor, ConnectivitySubscription};
pub use interceptor::{
    InstallReport, InterceptedRequest, InterceptedResponse, RequestInterceptor, RequestMode,
    ResponseSource,
};
pub use reconciler::{ReconcileOutcome, SyncReconciler, SyncStatus};
pub use record_service::{FetchOutcome, RecordService, SaveOutcome};
pub use sync_driver::{BackgroundSyncHandle, SyncDriver};
