use crate::domain::entities::CacheEntry;
use crate::domain::value_objects::CacheNamespace;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Versioned store of last-known-good responses.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(
        &self,
        namespace: &CacheNamespace,
        url: &str,
    ) -> Result<Option<CacheEntry>, AppError>;

    /// Replaces any previous entry for the same namespace and url.
    async fn put(&self, entry: CacheEntry) -> Result<(), AppError>;

    async fn namespaces(&self) -> Result<Vec<CacheNamespace>, AppError>;

    async fn purge_namespace(&self, namespace: &CacheNamespace) -> Result<u64, AppError>;
}
