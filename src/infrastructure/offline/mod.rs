pub mod disabled;
pub mod mappers;
pub mod rows;
pub mod sqlite_cache;
pub mod sqlite_queue;

pub use disabled::{DisabledMutationQueue, NoopResponseCache};
pub use sqlite_cache::SqliteResponseCache;
pub use sqlite_queue::SqliteMutationQueue;

use crate::application::ports::{MutationQueue, ResponseCache};
use crate::infrastructure::database::ConnectionPool;
use crate::shared::config::StorageConfig;
use crate::shared::error::AppError;
use std::sync::Arc;

/// The queue and cache backing one device, either durable or disabled.
#[derive(Clone)]
pub struct OfflineStore {
    pub queue: Arc<dyn MutationQueue>,
    pub cache: Arc<dyn ResponseCache>,
    pool: Option<ConnectionPool>,
}

impl OfflineStore {
    pub async fn try_open(config: &StorageConfig) -> Result<Self, AppError> {
        let pool = ConnectionPool::new(config).await?;
        pool.migrate().await?;
        Ok(Self {
            queue: Arc::new(SqliteMutationQueue::new(pool.get_pool().clone())),
            cache: Arc::new(SqliteResponseCache::new(pool.get_pool().clone())),
            pool: Some(pool),
        })
    }

    /// Opens durable storage, falling back to a disabled queue when the
    /// database cannot be opened or migrated.
    pub async fn open(config: &StorageConfig) -> Self {
        match Self::try_open(config).await {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(
                    target: "field_sync::queue",
                    error = %err,
                    "offline storage unavailable, queueing disabled"
                );
                Self::disabled(err.to_string())
            }
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            queue: Arc::new(DisabledMutationQueue::new(reason)),
            cache: Arc::new(NoopResponseCache),
            pool: None,
        }
    }

    pub fn is_durable(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
