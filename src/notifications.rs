// Unread-notification polling, independent of the workflow screens.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::api::wire::UnreadCount;
use crate::api::ApiError;
use crate::http::BackendClient;
use crate::shutdown::ShutdownSignal;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn unread_count(&self) -> Result<u64, ApiError>;
}

#[async_trait]
impl NotificationSource for BackendClient {
    async fn unread_count(&self) -> Result<u64, ApiError> {
        // Polled faster than the GET cache expires, so always ask the backend
        let body: UnreadCount = self
            .get_json_fresh("notifications/unread-count", &[])
            .await?;
        Ok(body.count)
    }
}

#[async_trait]
impl<T: NotificationSource + ?Sized> NotificationSource for Arc<T> {
    async fn unread_count(&self) -> Result<u64, ApiError> {
        (**self).unread_count().await
    }
}

/// Polls the unread count on a fixed interval until shutdown.
pub struct NotificationPoller<S> {
    source: S,
    every: Duration,
    last: Option<u64>,
}

impl<S: NotificationSource> NotificationPoller<S> {
    pub fn new(source: S, every: Duration) -> Self {
        Self {
            source,
            every: every.max(Duration::from_secs(1)),
            last: None,
        }
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// One poll. Failures are logged and leave the last count in place.
    pub async fn poll_once(&mut self) -> Option<u64> {
        match self.source.unread_count().await {
            Ok(count) => {
                if self.last != Some(count) {
                    info!(unread = count, "Unread notification count changed");
                } else {
                    debug!(unread = count, "Unread notification count unchanged");
                }
                self.last = Some(count);
                Some(count)
            }
            Err(e) => {
                warn!(error = %e, "Notification poll failed, will retry next tick");
                None
            }
        }
    }

    /// Poll until `shutdown` fires, calling `on_change` whenever the count
    /// differs from the previous successful poll.
    pub async fn run<F>(mut self, mut shutdown: ShutdownSignal, mut on_change: F)
    where
        F: FnMut(u64) + Send,
    {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    debug!("Notification poller stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let before = self.last;
                    if let Some(count) = self.poll_once().await {
                        if before != Some(count) {
                            on_change(count);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownCoordinator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_failed_poll_keeps_previous_count() {
        let mut source = MockNotificationSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_unread_count()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(4));
        source
            .expect_unread_count()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(ApiError::Timeout));

        let mut poller = NotificationPoller::new(source, Duration::from_secs(60));
        assert_eq!(poller.poll_once().await, Some(4));
        assert_eq!(poller.poll_once().await, None);
        assert_eq!(poller.last(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_survives_errors_and_stops_on_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut source = MockNotificationSource::new();
        source.expect_unread_count().returning(move || {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Err(ApiError::Network("connection refused".into())),
                1 => Ok(2),
                _ => Ok(5),
            }
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let coordinator = ShutdownCoordinator::new();
        let poller = NotificationPoller::new(source, Duration::from_secs(60));
        let handle = tokio::spawn(poller.run(coordinator.subscribe(), move |count| {
            sink.lock().unwrap().push(count)
        }));

        // ticks at 0s, 60s and 120s
        tokio::time::sleep(Duration::from_secs(150)).await;
        coordinator.trigger();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 5]);
    }

    #[tokio::test]
    async fn test_interval_has_a_floor() {
        let source = MockNotificationSource::new();
        let poller = NotificationPoller::new(source, Duration::ZERO);
        assert_eq!(poller.every, Duration::from_secs(1));
    }
}
