use crate::application::ports::{MutationQueue, ResponseCache};
use crate::domain::entities::{CacheEntry, MutationDraft, QueuedMutation};
use crate::domain::value_objects::{CacheNamespace, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Stand-in used when the local database cannot be opened. Writes fail fast
/// so they are never reported as saved.
pub struct DisabledMutationQueue {
    reason: String,
}

impl DisabledMutationQueue {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MutationQueue for DisabledMutationQueue {
    async fn enqueue(&self, _draft: MutationDraft) -> Result<QueuedMutation, AppError> {
        Err(AppError::StorageUnavailable(format!(
            "Offline queue disabled: {}",
            self.reason
        )))
    }

    async fn list_pending(&self) -> Result<Vec<QueuedMutation>, AppError> {
        Ok(Vec::new())
    }

    async fn mark_synced(&self, _id: &MutationId) -> Result<(), AppError> {
        Ok(())
    }

    async fn record_failure(&self, _id: &MutationId, _reason: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn prune_synced(&self) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn pending_count(&self) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<u64, AppError> {
        Ok(0)
    }
}

/// Cache that remembers nothing.
pub struct NoopResponseCache;

#[async_trait]
impl ResponseCache for NoopResponseCache {
    async fn get(
        &self,
        _namespace: &CacheNamespace,
        _url: &str,
    ) -> Result<Option<CacheEntry>, AppError> {
        Ok(None)
    }

    async fn put(&self, _entry: CacheEntry) -> Result<(), AppError> {
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<CacheNamespace>, AppError> {
        Ok(Vec::new())
    }

    async fn purge_namespace(&self, _namespace: &CacheNamespace) -> Result<u64, AppError> {
        Ok(0)
    }
}
