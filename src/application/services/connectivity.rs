use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 64;

/// Online/offline state shared by the interceptor, the health check and the
/// sync driver. Subscribers see each transition once.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    online: Arc<AtomicBool>,
    events: broadcast::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            online: Arc::new(AtomicBool::new(initially_online)),
            events,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Returns whether the state changed. Repeating the current state emits nothing.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }
        tracing::info!(
            target: "field_sync::connectivity",
            online,
            "connectivity changed"
        );
        // No receivers is fine.
        let _ = self.events.send(online);
        true
    }

    pub fn subscribe(&self) -> ConnectivitySubscription {
        ConnectivitySubscription {
            receiver: self.events.subscribe(),
            online: self.online.clone(),
        }
    }

    /// Runs `callback` for every transition on a spawned task until every
    /// monitor handle is dropped.
    pub fn on_transition<F, Fut>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(bool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut subscription = self.subscribe();
        tokio::spawn(async move {
            while let Some(online) = subscription.next().await {
                callback(online).await;
            }
        })
    }
}

pub struct ConnectivitySubscription {
    receiver: broadcast::Receiver<bool>,
    online: Arc<AtomicBool>,
}

impl ConnectivitySubscription {
    /// Next transition, or `None` once every monitor handle is gone.
    pub async fn next(&mut self) -> Option<bool> {
        match self.receiver.recv().await {
            Ok(online) => Some(online),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    target: "field_sync::connectivity",
                    skipped,
                    "connectivity subscriber lagged"
                );
                // Stale transitions are dropped in favour of the current state.
                self.receiver = self.receiver.resubscribe();
                Some(self.online.load(Ordering::SeqCst))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn set_online_reports_changes_only() {
        let monitor = ConnectivityMonitor::new(true);
        assert!(!monitor.set_online(true));
        assert!(monitor.set_online(false));
        assert!(!monitor.is_online());
        assert!(!monitor.set_online(false));
        assert!(monitor.set_online(true));
    }

    #[tokio::test]
    async fn subscribers_see_each_transition_once() {
        let monitor = ConnectivityMonitor::new(true);
        let mut sub = monitor.subscribe();

        monitor.set_online(false);
        monitor.set_online(false);
        monitor.set_online(true);
        monitor.set_online(false);

        assert_eq!(sub.next().await, Some(false));
        assert_eq!(sub.next().await, Some(true));
        assert_eq!(sub.next().await, Some(false));
        assert!(
            tokio::time::timeout(Duration::from_millis(50), sub.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn lagging_subscriber_resyncs_on_current_state() {
        let monitor = ConnectivityMonitor::new(false);
        let mut sub = monitor.subscribe();
        for i in 0..(CHANNEL_CAPACITY * 2 + 1) {
            monitor.set_online(i % 2 == 0);
        }
        assert!(monitor.is_online());
        assert_eq!(sub.next().await, Some(true));
        assert!(
            tokio::time::timeout(Duration::from_millis(50), sub.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn subscription_ends_when_monitor_dropped() {
        let monitor = ConnectivityMonitor::new(true);
        let mut sub = monitor.subscribe();
        drop(monitor);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn on_transition_invokes_callback() {
        let monitor = ConnectivityMonitor::new(false);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = monitor.on_transition(move |online| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(online);
            }
        });

        monitor.set_online(true);
        monitor.set_online(false);

        assert_eq!(rx.recv().await, Some(true));
        assert_eq!(rx.recv().await, Some(false));
        handle.abort();
    }
}
