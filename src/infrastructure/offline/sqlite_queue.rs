use super::mappers::{encode_headers, queued_mutation_from_row};
use super::rows::QueuedMutationRow;
use crate::application::ports::MutationQueue;
use crate::domain::entities::{MutationDraft, QueuedMutation};
use crate::domain::value_objects::MutationId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const SELECT_COLUMNS: &str = "id, target_url, method, payload, headers, record_type, priority, \
     created_at, synced, synced_at, attempts, last_error, last_attempt_at";

pub struct SqliteMutationQueue {
    pool: SqlitePool,
}

impl SqliteMutationQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MutationQueue for SqliteMutationQueue {
    async fn enqueue(&self, draft: MutationDraft) -> Result<QueuedMutation, AppError> {
        let MutationDraft {
            id,
            target_url,
            method,
            payload,
            headers,
        } = draft;
        let id = id.unwrap_or_else(MutationId::generate);
        let created_at = Utc::now();
        let record_type = payload.record_type().map(str::to_string);
        let body = serde_json::to_string(payload.as_json())?;
        let encoded_headers = encode_headers(&headers)?;

        let result = sqlx::query(
            r#"
            INSERT INTO queued_mutations (
                id, target_url, method, payload, headers, record_type, priority, created_at,
                synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
            "#,
        )
        .bind(id.as_str())
        .bind(&target_url)
        .bind(method.as_str())
        .bind(&body)
        .bind(&encoded_headers)
        .bind(record_type.as_deref())
        .bind(i64::from(method.priority()))
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return Err(AppError::ValidationError(format!(
                        "Mutation {id} is already queued"
                    )));
                }
            }
            tracing::error!(
                target: "field_sync::queue",
                mutation_id = %id,
                error = %err,
                "enqueue failed"
            );
            return Err(err.into());
        }

        tracing::debug!(
            target: "field_sync::queue",
            mutation_id = %id,
            method = method.as_str(),
            target_url = %target_url,
            "mutation queued"
        );

        Ok(QueuedMutation {
            id,
            target_url,
            method,
            priority: method.priority(),
            payload,
            headers,
            record_type,
            created_at,
            synced: false,
            synced_at: None,
            attempts: 0,
            last_error: None,
            last_attempt_at: None,
        })
    }

    async fn list_pending(&self) -> Result<Vec<QueuedMutation>, AppError> {
        let rows = sqlx::query_as::<_, QueuedMutationRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM queued_mutations WHERE synced = 0 \
             ORDER BY created_at ASC, seq ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        // A row that no longer maps must not block the rest of the queue.
        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match queued_mutation_from_row(row) {
                Ok(mutation) => pending.push(mutation),
                Err(err) => {
                    tracing::error!(
                        target: "field_sync::queue",
                        mutation_id = %id,
                        error = %err,
                        "skipping unreadable queued mutation"
                    );
                }
            }
        }
        Ok(pending)
    }

    async fn mark_synced(&self, id: &MutationId) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE queued_mutations
            SET synced = 1, synced_at = ?1
            WHERE id = ?2 AND synced = 0
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                target: "field_sync::queue",
                mutation_id = %id,
                "mark_synced had nothing to do"
            );
        }
        Ok(())
    }

    async fn record_failure(&self, id: &MutationId, reason: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE queued_mutations
            SET attempts = attempts + 1, last_error = ?1, last_attempt_at = ?2
            WHERE id = ?3 AND synced = 0
            "#,
        )
        .bind(reason)
        .bind(Utc::now().timestamp_millis())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn prune_synced(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM queued_mutations WHERE synced = 1")
            .execute(&self.pool)
            .await?;
        let pruned = result.rows_affected();
        if pruned > 0 {
            tracing::debug!(target: "field_sync::queue", pruned, "pruned synced mutations");
        }
        Ok(pruned)
    }

    async fn pending_count(&self) -> Result<u64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queued_mutations WHERE synced = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn clear(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM queued_mutations")
            .execute(&self.pool)
            .await?;
        tracing::info!(
            target: "field_sync::queue",
            removed = result.rows_affected(),
            "queue cleared"
        );
        Ok(result.rows_affected())
    }
}
