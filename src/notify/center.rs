//! Notification center.
//!
//! Single entry point for user-facing notifications: filters through a
//! [`NotificationDeduplicator`] and renders through a [`NotificationSink`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::dedup::NotificationDeduplicator;
use crate::config::DedupConfig;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Neutral information.
    Info,
    /// Something good happened (badge, level-up).
    Success,
    /// Degraded but working.
    Warning,
    /// Something failed.
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Text shown to the player.
    pub message: String,
    /// Severity.
    pub level: NotificationLevel,
    /// Stays on screen until dismissed; never suppressed.
    pub persistent: bool,
}

impl Notification {
    /// Create a notification.
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            persistent: false,
        }
    }

    /// Informational notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    /// Success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// Warning notification.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    /// Error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// Mark as persistent (not auto-dismissed, never deduplicated).
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

/// Renders accepted notifications.
pub trait NotificationSink: Send + Sync + 'static {
    /// Display one notification.
    fn display(&self, notification: &Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(&Notification) + Send + Sync + 'static,
{
    fn display(&self, notification: &Notification) {
        self(notification)
    }
}

/// Sink that writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn display(&self, n: &Notification) {
        match n.level {
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(persistent = n.persistent, "{}", n.message)
            }
            NotificationLevel::Warning => warn!(persistent = n.persistent, "{}", n.message),
            NotificationLevel::Error => error!(persistent = n.persistent, "{}", n.message),
        }
    }
}

/// Sink that queues notifications for a UI loop to drain.
///
/// Clones share the same queue, so keep one clone and hand the other to the
/// center.
#[derive(Debug, Clone, Default)]
pub struct QueueSink {
    queue: Arc<Mutex<Vec<Notification>>>,
}

impl QueueSink {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *lock(&self.queue))
    }

    /// Number of queued notifications.
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }
}

impl NotificationSink for QueueSink {
    fn display(&self, notification: &Notification) {
        lock(&self.queue).push(notification.clone());
    }
}

/// Deduplicating notification dispatcher.
pub struct NotificationCenter {
    dedup: Mutex<NotificationDeduplicator>,
    sink: Box<dyn NotificationSink>,
}

impl NotificationCenter {
    /// Create a center rendering through `sink`.
    pub fn new(config: DedupConfig, sink: impl NotificationSink) -> Self {
        Self {
            dedup: Mutex::new(NotificationDeduplicator::new(config)),
            sink: Box::new(sink),
        }
    }

    /// Create a center that logs through `tracing`.
    pub fn tracing(config: DedupConfig) -> Self {
        Self::new(config, TracingSink)
    }

    /// Submit a notification. Returns whether it was displayed.
    pub fn notify(&self, notification: Notification) -> bool {
        let now = Instant::now();
        let shown = {
            let mut dedup = lock(&self.dedup);
            if notification.persistent {
                dedup.record(&notification.message, now);
                true
            } else {
                dedup.should_show(&notification.message, now)
            }
        };

        if shown {
            self.sink.display(&notification);
        } else {
            debug!(message = %notification.message, "notification suppressed");
        }
        shown
    }

    /// Sweep expired history now.
    pub fn sweep(&self) {
        lock(&self.dedup).sweep(Instant::now());
    }

    /// Number of retained history records.
    pub fn history_len(&self) -> usize {
        lock(&self.dedup).len()
    }

    /// Spawn the periodic history sweep.
    ///
    /// The task ends on its own once the center is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let interval = lock(&self.dedup).config().sweep_interval;
        let center: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(center) = center.upgrade() else {
                    break;
                };
                center.sweep();
            }
        })
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("dedup", &self.dedup)
            .field("sink", &"[sink]")
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn center() -> (NotificationCenter, QueueSink) {
        let sink = QueueSink::new();
        (NotificationCenter::new(DedupConfig::default(), sink.clone()), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_displays_then_suppresses() {
        let (center, sink) = center();
        assert!(center.notify(Notification::success("Badge obtenu!")));
        assert!(!center.notify(Notification::info("Something else")));
        assert_eq!(sink.drain().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_bypasses_cooldown() {
        let (center, sink) = center();
        center.notify(Notification::info("hello"));
        assert!(center.notify(Notification::error("Sync failed").persistent()));

        let shown = sink.drain();
        assert_eq!(shown.len(), 2);
        assert!(shown[1].persistent);
        assert_eq!(shown[1].level, NotificationLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires_with_time() {
        let (center, sink) = center();
        center.notify(Notification::info("one"));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(center.notify(Notification::info("two")));
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_clears_history() {
        let center = Arc::new(NotificationCenter::new(DedupConfig::default(), QueueSink::new()));
        let handle = center.spawn_sweeper();

        center.notify(Notification::info("one"));
        assert_eq!(center.history_len(), 1);

        tokio::time::sleep(Duration::from_secs(331)).await;
        assert_eq!(center.history_len(), 0);
        handle.abort();
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let center = NotificationCenter::new(DedupConfig::default(), move |n: &Notification| {
            captured.lock().unwrap().push(n.message.clone());
        });
        center.notify(Notification::warning("careful"));
        assert_eq!(*seen.lock().unwrap(), vec!["careful".to_string()]);
    }
}
