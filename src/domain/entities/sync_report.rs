use crate::domain::value_objects::MutationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What asked the reconciler to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    ConnectivityRestored,
    BackgroundSync,
    Periodic,
    Manual,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::ConnectivityRestored => "connectivity_restored",
            SyncTrigger::BackgroundSync => "background_sync",
            SyncTrigger::Periodic => "periodic",
            SyncTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationFailure {
    pub id: MutationId,
    pub reason: String,
}

/// Totals across every pass a single `reconcile` call ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub passes: u32,
    pub attempted: u32,
    pub synced: u32,
    pub failed: u32,
    pub pruned: u64,
    pub remaining: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub failures: Vec<MutationFailure>,
}

impl SyncReport {
    pub fn start(trigger: SyncTrigger) -> Self {
        let now = Utc::now();
        Self {
            trigger,
            passes: 0,
            attempted: 0,
            synced: 0,
            failed: 0,
            pruned: 0,
            remaining: 0,
            started_at: now,
            finished_at: now,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.synced += 1;
    }

    pub fn record_failure(&mut self, id: MutationId, reason: impl Into<String>) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(MutationFailure {
            id,
            reason: reason.into(),
        });
    }

    pub fn finish(&mut self, remaining: u64) {
        self.remaining = remaining;
        self.finished_at = Utc::now();
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
