use crate::domain::entities::{MutationDraft, QueuedMutation};
use crate::domain::value_objects::MutationId;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable store of writes waiting for connectivity.
#[async_trait]
pub trait MutationQueue: Send + Sync {
    /// Assigns an id when the draft has none and stores it as pending.
    async fn enqueue(&self, draft: MutationDraft) -> Result<QueuedMutation, AppError>;

    /// Pending entries in enqueue order.
    async fn list_pending(&self) -> Result<Vec<QueuedMutation>, AppError>;

    /// No-op for unknown or already synced ids.
    async fn mark_synced(&self, id: &MutationId) -> Result<(), AppError>;

    async fn record_failure(&self, id: &MutationId, reason: &str) -> Result<(), AppError>;

    /// Deletes every synced entry and returns how many were removed.
    async fn prune_synced(&self) -> Result<u64, AppError>;

    async fn pending_count(&self) -> Result<u64, AppError>;

    async fn clear(&self) -> Result<u64, AppError>;
}
