use crate::shared::config::StorageConfig;
use crate::shared::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

const PAGE_SIZE: u64 = 4096;

#[derive(Clone)]
pub struct ConnectionPool {
    pool: Arc<SqlitePool>,
}

impl ConnectionPool {
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        let in_memory = config.database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .pragma("page_size", PAGE_SIZE.to_string());
        if let Some(max_bytes) = config.max_queue_bytes {
            options = options.pragma("max_page_count", max_page_count(max_bytes).to_string());
        }

        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::StorageUnavailable(format!(
                            "Cannot create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }

        // Every connection to `:memory:` is its own database.
        let max_connections = if in_memory {
            1
        } else {
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        tracing::debug!(
            target: "field_sync::queue",
            database_url = %config.database_url,
            max_connections,
            quota_bytes = ?config.max_queue_bytes,
            "database pool ready"
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn from_memory() -> Result<Self, AppError> {
        Self::new(&StorageConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            max_queue_bytes: None,
        })
        .await
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn max_page_count(max_bytes: u64) -> u64 {
    (max_bytes / PAGE_SIZE).max(1)
}
