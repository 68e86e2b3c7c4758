use crate::application::services::reconciler::{ReconcileOutcome, SyncReconciler};
use crate::application::services::{ConnectivityMonitor, ConnectivitySubscription};
use crate::domain::entities::SyncTrigger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const BACKGROUND_SYNC_CAPACITY: usize = 8;

/// Platform-level "sync now" signal. Requests beyond the buffer are dropped
/// since one pending request already guarantees a pass.
#[derive(Clone)]
pub struct BackgroundSyncHandle {
    sender: mpsc::Sender<()>,
}

impl BackgroundSyncHandle {
    pub fn request(&self) -> bool {
        self.sender.try_send(()).is_ok()
    }
}

/// Turns connectivity transitions, background-sync signals and an optional
/// timer into reconciliation runs.
pub struct SyncDriver {
    reconciler: Arc<SyncReconciler>,
    subscription: ConnectivitySubscription,
    background: Option<mpsc::Receiver<()>>,
    interval: Option<Duration>,
}

impl SyncDriver {
    pub fn new(reconciler: Arc<SyncReconciler>, monitor: &ConnectivityMonitor) -> Self {
        Self {
            reconciler,
            subscription: monitor.subscribe(),
            background: None,
            interval: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn background_sync(&mut self) -> BackgroundSyncHandle {
        let (sender, receiver) = mpsc::channel(BACKGROUND_SYNC_CAPACITY);
        self.background = Some(receiver);
        BackgroundSyncHandle { sender }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: CancellationToken) {
        let SyncDriver {
            reconciler,
            mut subscription,
            mut background,
            interval,
        } = self;
        let mut ticker = interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        tracing::debug!(target: "field_sync::sync", interval = ?interval, "sync driver started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = subscription.next() => match event {
                    Some(true) => dispatch(&reconciler, SyncTrigger::ConnectivityRestored),
                    Some(false) => {}
                    None => break,
                },
                signal = next_signal(&mut background) => match signal {
                    Some(()) => dispatch(&reconciler, SyncTrigger::BackgroundSync),
                    None => background = None,
                },
                _ = next_tick(&mut ticker) => dispatch(&reconciler, SyncTrigger::Periodic),
            }
        }
        tracing::debug!(target: "field_sync::sync", "sync driver stopped");
    }
}

/// Each run gets its own task so triggers keep flowing (and coalescing)
/// while a pass is in flight.
fn dispatch(reconciler: &Arc<SyncReconciler>, trigger: SyncTrigger) {
    let reconciler = Arc::clone(reconciler);
    tokio::spawn(async move {
        match reconciler.reconcile(trigger).await {
            Ok(ReconcileOutcome::Completed(report)) => {
                tracing::debug!(
                    target: "field_sync::sync",
                    trigger = trigger.as_str(),
                    synced = report.synced,
                    remaining = report.remaining,
                    "triggered sync completed"
                );
            }
            Ok(outcome) => {
                tracing::trace!(
                    target: "field_sync::sync",
                    trigger = trigger.as_str(),
                    ?outcome,
                    "triggered sync not run"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: "field_sync::sync",
                    trigger = trigger.as_str(),
                    error = %err,
                    "triggered sync failed"
                );
            }
        }
    });
}

async fn next_signal(receiver: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
