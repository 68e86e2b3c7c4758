use super::mappers::{cache_entry_from_row, encode_headers};
use super::rows::CachedResponseRow;
use crate::application::ports::ResponseCache;
use crate::domain::entities::CacheEntry;
use crate::domain::value_objects::CacheNamespace;
use crate::shared::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteResponseCache {
    pool: SqlitePool,
}

impl SqliteResponseCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseCache for SqliteResponseCache {
    async fn get(
        &self,
        namespace: &CacheNamespace,
        url: &str,
    ) -> Result<Option<CacheEntry>, AppError> {
        let row = sqlx::query_as::<_, CachedResponseRow>(
            r#"
            SELECT namespace, url, status, headers, body, stored_at
            FROM cached_responses
            WHERE namespace = ?1 AND url = ?2
            "#,
        )
        .bind(namespace.as_str())
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(cache_entry_from_row).transpose()
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), AppError> {
        let headers = encode_headers(&entry.headers)?;
        sqlx::query(
            r#"
            INSERT INTO cached_responses (namespace, url, status, headers, body, stored_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(namespace, url) DO UPDATE SET
                status = excluded.status,
                headers = excluded.headers,
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(entry.namespace.as_str())
        .bind(&entry.url)
        .bind(i64::from(entry.status))
        .bind(&headers)
        .bind(entry.body.as_ref())
        .bind(entry.stored_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        tracing::trace!(
            target: "field_sync::cache",
            namespace = %entry.namespace,
            url = %entry.url,
            "cached response"
        );
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<CacheNamespace>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT namespace FROM cached_responses ORDER BY namespace",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names.into_iter().map(CacheNamespace::from_raw).collect())
    }

    async fn purge_namespace(&self, namespace: &CacheNamespace) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cached_responses WHERE namespace = ?1")
            .bind(namespace.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
