use crate::application::ports::{HttpTransport, MutationQueue, OutboundRequest};
use crate::application::services::ConnectivityMonitor;
use crate::domain::entities::{QueuedMutation, SyncReport, SyncTrigger};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub pending: u64,
    /// Pending entries that reached the attempt threshold.
    pub stuck: u64,
    pub last_sync: Option<DateTime<Utc>>,
    pub total_synced: u64,
    pub consecutive_failed_passes: u32,
    pub last_report: Option<SyncReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Completed(SyncReport),
    /// Another call is mid-pass and will run again before returning.
    Coalesced,
    SkippedOffline,
}

#[derive(Default)]
struct PassGate {
    running: bool,
    rerun: bool,
}

/// Clears the running flag even if the pass future is dropped.
struct PassGuard<'a> {
    gate: &'a Mutex<PassGate>,
    armed: bool,
}

impl PassGuard<'_> {
    /// Consumes a pending rerun request, or releases the gate when there is
    /// none. Both happen under one lock so no trigger is lost in between.
    fn rerun_or_release(&mut self) -> bool {
        let Ok(mut gate) = self.gate.lock() else {
            return false;
        };
        if gate.rerun {
            gate.rerun = false;
            return true;
        }
        gate.running = false;
        self.armed = false;
        false
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut gate) = self.gate.lock() {
            gate.running = false;
            gate.rerun = false;
        }
    }
}

enum ReplayFailure {
    /// The API answered with a non-2xx status.
    Rejected(String),
    /// No answer: connection error or timeout.
    Unreachable(String),
}

/// Replays queued mutations against the API, one pass at a time.
pub struct SyncReconciler {
    queue: Arc<dyn MutationQueue>,
    transport: Arc<dyn HttpTransport>,
    monitor: ConnectivityMonitor,
    timeout: Duration,
    stuck_after_attempts: u32,
    gate: Mutex<PassGate>,
    status: RwLock<SyncStatus>,
}

impl SyncReconciler {
    pub fn new(
        queue: Arc<dyn MutationQueue>,
        transport: Arc<dyn HttpTransport>,
        monitor: ConnectivityMonitor,
        timeout: Duration,
        stuck_after_attempts: u32,
    ) -> Self {
        Self {
            queue,
            transport,
            monitor,
            timeout,
            stuck_after_attempts,
            gate: Mutex::new(PassGate::default()),
            status: RwLock::new(SyncStatus {
                is_syncing: false,
                pending: 0,
                stuck: 0,
                last_sync: None,
                total_synced: 0,
                consecutive_failed_passes: 0,
                last_report: None,
            }),
        }
    }

    pub async fn reconcile(&self, trigger: SyncTrigger) -> Result<ReconcileOutcome, AppError> {
        if !self.monitor.is_online() {
            tracing::debug!(
                target: "field_sync::sync",
                trigger = trigger.as_str(),
                "offline, sync skipped"
            );
            return Ok(ReconcileOutcome::SkippedOffline);
        }

        let mut guard = match self.try_begin() {
            Some(guard) => guard,
            None => {
                tracing::debug!(
                    target: "field_sync::sync",
                    trigger = trigger.as_str(),
                    "sync already running, coalesced"
                );
                return Ok(ReconcileOutcome::Coalesced);
            }
        };

        let result = self.run_passes(trigger, &mut guard).await;
        drop(guard);
        self.finish(&result).await;

        result.map(ReconcileOutcome::Completed)
    }

    pub async fn status(&self) -> SyncStatus {
        let mut status = self.status.read().await.clone();
        status.is_syncing = self.is_running();
        match self.queue.list_pending().await {
            Ok(pending) => {
                status.pending = pending.len() as u64;
                status.stuck = self.count_stuck(&pending);
            }
            Err(err) => {
                tracing::warn!(
                    target: "field_sync::sync",
                    error = %err,
                    "failed to read queue for status"
                );
            }
        }
        status
    }

    fn try_begin(&self) -> Option<PassGuard<'_>> {
        let mut gate = self.gate.lock().ok()?;
        if gate.running {
            gate.rerun = true;
            return None;
        }
        gate.running = true;
        gate.rerun = false;
        Some(PassGuard {
            gate: &self.gate,
            armed: true,
        })
    }

    fn is_running(&self) -> bool {
        self.gate.lock().map(|gate| gate.running).unwrap_or(false)
    }

    async fn run_passes(
        &self,
        trigger: SyncTrigger,
        guard: &mut PassGuard<'_>,
    ) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::start(trigger);
        loop {
            self.run_pass(&mut report).await?;
            if !self.monitor.is_online() || !guard.rerun_or_release() {
                break;
            }
            tracing::debug!(target: "field_sync::sync", "trigger arrived mid-pass, running again");
        }
        report.finish(self.queue.pending_count().await?);

        tracing::info!(
            target: "field_sync::sync",
            trigger = trigger.as_str(),
            passes = report.passes,
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            remaining = report.remaining,
            "sync finished"
        );
        Ok(report)
    }

    async fn run_pass(&self, report: &mut SyncReport) -> Result<(), AppError> {
        report.passes += 1;
        let snapshot = self.queue.list_pending().await?;

        for mutation in snapshot {
            match self.replay(&mutation).await {
                Ok(()) => {
                    self.queue.mark_synced(&mutation.id).await?;
                    report.record_success();
                }
                Err(ReplayFailure::Rejected(reason)) => {
                    tracing::warn!(
                        target: "field_sync::sync",
                        mutation_id = %mutation.id,
                        url = %mutation.target_url,
                        %reason,
                        "replay rejected, left pending"
                    );
                    self.queue.record_failure(&mutation.id, &reason).await?;
                    report.record_failure(mutation.id.clone(), reason);
                }
                Err(ReplayFailure::Unreachable(reason)) => {
                    // Not the entry's fault, so it does not count toward stuck.
                    tracing::debug!(
                        target: "field_sync::sync",
                        mutation_id = %mutation.id,
                        url = %mutation.target_url,
                        %reason,
                        "api unreachable, left pending"
                    );
                    self.monitor.set_online(false);
                    report.record_failure(mutation.id.clone(), reason);
                }
            }
        }

        report.pruned += self.queue.prune_synced().await?;
        Ok(())
    }

    async fn replay(&self, mutation: &QueuedMutation) -> Result<(), ReplayFailure> {
        let body = mutation
            .payload
            .to_bytes()
            .map_err(|e| ReplayFailure::Rejected(e.to_string()))?;
        let mut request =
            OutboundRequest::new(mutation.method.to_http(), mutation.target_url.clone());
        for (name, value) in &mutation.headers {
            if name.eq_ignore_ascii_case("content-type")
                || name.eq_ignore_ascii_case(IDEMPOTENCY_KEY_HEADER)
            {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }
        let request = request
            .header("Content-Type", "application/json")
            .header(IDEMPOTENCY_KEY_HEADER, mutation.id.as_str())
            .body(body);

        match tokio::time::timeout(self.timeout, self.transport.send(&request)).await {
            Ok(Ok(response)) if response.is_success() => Ok(()),
            Ok(Ok(response)) => Err(ReplayFailure::Rejected(format!(
                "HTTP {}: {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            ))),
            Ok(Err(err)) => Err(ReplayFailure::Unreachable(err.to_string())),
            Err(_) => Err(ReplayFailure::Unreachable("request timed out".to_string())),
        }
    }

    async fn finish(&self, result: &Result<SyncReport, AppError>) {
        let mut status = self.status.write().await;
        match result {
            Ok(report) => {
                status.last_sync = Some(report.finished_at);
                status.total_synced += u64::from(report.synced);
                status.pending = report.remaining;
                if report.is_clean() {
                    status.consecutive_failed_passes = 0;
                } else {
                    status.consecutive_failed_passes += 1;
                }
                status.last_report = Some(report.clone());
            }
            Err(err) => {
                status.consecutive_failed_passes += 1;
                tracing::error!(
                    target: "field_sync::sync",
                    error = %err,
                    "sync aborted by storage error"
                );
            }
        }
    }

    fn count_stuck(&self, pending: &[QueuedMutation]) -> u64 {
        pending
            .iter()
            .filter(|m| m.is_stuck(self.stuck_after_attempts))
            .count() as u64
    }
}
