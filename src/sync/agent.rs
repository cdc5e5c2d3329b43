//! Progression sync agent.
//!
//! Keeps an eventually-consistent mirror of the server's progression:
//! - one periodic poller per agent, polls never overlap
//! - structural diff against the last confirmed snapshot
//! - typed events and update callbacks on every committed change
//! - linear retry backoff, then a persistent notification and recovery
//!
//! Share one agent between widgets by cloning the handle; every clone drives
//! the same state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::events::{
    EventCallback, EventHandle, ProgressionEvent, Registry, SharedRegistry, SubscriptionHandle,
    UpdateCallback, UpdateHandle, invoke_isolated, lock,
};
use super::retry::RetryDecision;
use super::state::{AgentStatus, SyncAgentState};
use crate::config::{AgentConfig, DedupConfig, RecoveryPolicy};
use crate::core::{
    Predictable, ProgressionSource, RecoveryHook, SourceError, SubscriberError, SyncError,
};
use crate::notify::{Notification, NotificationCenter};
use crate::progression::{LocalDelta, ProgressionSnapshot, SnapshotDiff};

/// Buffered events per [`subscribe_events`](ProgressionSyncAgent::subscribe_events) receiver.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Shown when the retry budget is exhausted and recovery will follow.
pub const TERMINAL_MESSAGE_RELOAD: &str = "Progression sync is unavailable. Reloading...";

/// Shown when the retry budget is exhausted and recovery is disabled.
pub const TERMINAL_MESSAGE: &str = "Progression sync is unavailable.";

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A changed snapshot was committed and broadcast.
    Committed,
    /// The snapshot matched the mirror; nothing was broadcast.
    Unchanged,
    /// Another poll was in flight, or the agent was stopped meanwhile.
    Skipped,
    /// The fetch failed; the retry path took over.
    Failed(SourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerKind {
    Periodic,
    Forced,
    Retry,
    Recovery,
}

/// Why a poll runs, and under which start/stop generation it was issued.
#[derive(Debug, Clone, Copy)]
struct Trigger {
    kind: TriggerKind,
    generation: u64,
}

impl TriggerKind {
    fn label(self) -> &'static str {
        match self {
            TriggerKind::Periodic => "periodic",
            TriggerKind::Forced => "forced",
            TriggerKind::Retry => "retry",
            TriggerKind::Recovery => "recovery",
        }
    }
}

#[derive(Default)]
struct Timers {
    periodic: Option<JoinHandle<()>>,
    pending: Vec<JoinHandle<()>>,
}

/// Clears the in-flight flag when the poll ends, including on cancellation.
struct PollGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PollGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct Inner<P> {
    source: P,
    config: AgentConfig,
    state: Mutex<SyncAgentState>,
    polling: AtomicBool,
    /// Bumped by `stop()`; work issued under an older generation is dropped.
    generation: AtomicU64,
    /// Highest mirror revision already broadcast.
    dispatched: AtomicU64,
    timers: Mutex<Timers>,
    updates: SharedRegistry<UpdateCallback>,
    listeners: SharedRegistry<EventCallback>,
    events: broadcast::Sender<ProgressionEvent>,
    notifications: Arc<NotificationCenter>,
    recovery_hook: Option<Arc<dyn RecoveryHook>>,
}

/// Builder for a [`ProgressionSyncAgent`].
pub struct AgentBuilder<P> {
    source: P,
    config: AgentConfig,
    notifications: Option<Arc<NotificationCenter>>,
    recovery_hook: Option<Arc<dyn RecoveryHook>>,
}

impl<P: ProgressionSource> AgentBuilder<P> {
    /// Set the agent configuration.
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Route the terminal failure notification through `center`.
    ///
    /// Defaults to a center that logs through `tracing`.
    pub fn notifications(mut self, center: Arc<NotificationCenter>) -> Self {
        self.notifications = Some(center);
        self
    }

    /// Replace the built-in reload (drop mirror, poll again) with `hook`.
    pub fn recovery_hook(mut self, hook: impl RecoveryHook) -> Self {
        self.recovery_hook = Some(Arc::new(hook));
        self
    }

    /// Build the agent. Nothing runs until [`ProgressionSyncAgent::start`]
    /// or [`ProgressionSyncAgent::force_sync`].
    pub fn build(self) -> ProgressionSyncAgent<P> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = SyncAgentState::new(self.config.poll_interval, self.config.max_retries);
        let notifications = self
            .notifications
            .unwrap_or_else(|| Arc::new(NotificationCenter::tracing(DedupConfig::default())));

        ProgressionSyncAgent {
            inner: Arc::new(Inner {
                source: self.source,
                config: self.config,
                state: Mutex::new(state),
                polling: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                dispatched: AtomicU64::new(0),
                timers: Mutex::new(Timers::default()),
                updates: Arc::new(Mutex::new(Registry::new())),
                listeners: Arc::new(Mutex::new(Registry::new())),
                events,
                notifications,
                recovery_hook: self.recovery_hook,
            }),
        }
    }
}

/// Polls a [`ProgressionSource`] and mirrors its progression.
///
/// Must be used from within a Tokio runtime.
///
/// # Example
///
/// ```ignore
/// use arkalia_sync::prelude::*;
///
/// let source = HttpProgressionSource::new(&config.source)?;
/// let agent = ProgressionSyncAgent::new(source, config.agent.clone());
///
/// agent.on_event(|event| {
///     if let ProgressionEvent::LevelUp { level } = event {
///         println!("level {level}!");
///     }
///     Ok(())
/// });
/// agent.start(config.agent.poll_interval);
/// ```
pub struct ProgressionSyncAgent<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for ProgressionSyncAgent<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: ProgressionSource> ProgressionSyncAgent<P> {
    /// Create an agent with default notifications and recovery.
    pub fn new(source: P, config: AgentConfig) -> Self {
        Self::builder(source).config(config).build()
    }

    /// Start building an agent.
    pub fn builder(source: P) -> AgentBuilder<P> {
        AgentBuilder {
            source,
            config: AgentConfig::default(),
            notifications: None,
            recovery_hook: None,
        }
    }

    /// Start periodic polling. The first poll runs immediately.
    ///
    /// Returns `false` without creating a second timer if the agent is
    /// already running, or if `poll_interval` is zero.
    pub fn start(&self, poll_interval: Duration) -> bool {
        if poll_interval.is_zero() {
            warn!("refusing to start with a zero poll interval");
            return false;
        }

        let mut timers = lock(&self.inner.timers);
        if timers.periodic.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("sync agent already running");
            return false;
        }

        lock(&self.inner.state).backoff.set_unit(poll_interval);
        let generation = self.inner.generation.load(Ordering::Acquire);
        let agent = Arc::downgrade(&self.inner);

        timers.periodic = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = agent.upgrade() else {
                    break;
                };
                let trigger = Trigger {
                    kind: TriggerKind::Periodic,
                    generation,
                };
                inner.poll(trigger).await;
            }
        }));

        info!(
            source = %self.inner.source.describe(),
            interval_ms = poll_interval.as_millis() as u64,
            "progression sync started"
        );
        true
    }

    /// Stop polling and cancel every pending retry or recovery.
    ///
    /// Safe to call repeatedly or before [`start`](Self::start).
    pub fn stop(&self) {
        let mut timers = lock(&self.inner.timers);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);

        let was_running = timers.periodic.is_some();
        if let Some(handle) = timers.periodic.take() {
            handle.abort();
        }
        for handle in timers.pending.drain(..) {
            handle.abort();
        }

        if was_running {
            info!("progression sync stopped");
        }
    }

    /// Whether the periodic timer is active.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.timers)
            .periodic
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Poll now, out of band. Dropped (not queued) if a poll is in flight.
    pub async fn force_sync(&self) -> PollOutcome {
        let trigger = Trigger {
            kind: TriggerKind::Forced,
            generation: self.inner.generation.load(Ordering::Acquire),
        };
        self.inner.poll(trigger).await
    }

    /// Register a callback for every committed snapshot, including optimistic
    /// ones. Callbacks run in registration order; a failing callback is
    /// logged and does not affect the others.
    pub fn on_update<F>(&self, callback: F) -> UpdateHandle
    where
        F: Fn(&ProgressionSnapshot) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = lock(&self.inner.updates).insert(Arc::new(callback));
        SubscriptionHandle::new(&self.inner.updates, id)
    }

    /// Register a callback for every emitted event.
    pub fn on_event<F>(&self, callback: F) -> EventHandle
    where
        F: Fn(&ProgressionEvent) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = lock(&self.inner.listeners).insert(Arc::new(callback));
        SubscriptionHandle::new(&self.inner.listeners, id)
    }

    /// Receive events asynchronously. Slow receivers may lag and lose events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ProgressionEvent> {
        self.inner.events.subscribe()
    }

    /// Number of registered update and event callbacks.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.updates).len() + lock(&self.inner.listeners).len()
    }

    /// Apply a local change before the server confirms it.
    ///
    /// The mirror is updated in place and update callbacks run immediately.
    /// The next successful poll replaces the prediction with the server's
    /// snapshot.
    pub fn apply_optimistic_local_update(
        &self,
        delta: LocalDelta,
    ) -> Result<ProgressionSnapshot, SyncError> {
        let (snapshot, revision) = {
            let mut state = lock(&self.inner.state);
            let Some(mirror) = state.last_snapshot.as_mut() else {
                return Err(SyncError::NotInitialized);
            };
            mirror.predict(&delta);
            let snapshot = mirror.clone();
            state.provisional = true;
            state.revision += 1;
            (snapshot, state.revision)
        };

        debug!(kind = delta.kind(), "optimistic update applied");
        self.inner.dispatch_update(revision, &snapshot);
        Ok(snapshot)
    }

    /// The current mirror, if any snapshot was received.
    pub fn snapshot(&self) -> Option<ProgressionSnapshot> {
        lock(&self.inner.state).last_snapshot.clone()
    }

    /// Health view of the agent.
    pub fn status(&self) -> AgentStatus {
        let running = self.is_running();
        let is_polling = self.inner.polling.load(Ordering::Acquire);
        let now = Instant::now();
        let state = lock(&self.inner.state);
        let since = |t: Option<Instant>| t.map(|t| now.saturating_duration_since(t).as_millis() as u64);

        AgentStatus {
            running,
            is_polling,
            has_snapshot: state.last_snapshot.is_some(),
            provisional: state.provisional,
            retry_count: state.backoff.retry_count(),
            last_retry_delay_ms: state.last_retry_delay.map(|d| d.as_millis() as u64),
            since_last_poll_ms: since(state.last_poll_time),
            since_last_success_ms: since(state.last_success_time),
            terminal_failures: state.terminal_failures,
        }
    }

    /// Agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// Notification center used for the terminal failure.
    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.inner.notifications
    }
}

impl<P: ProgressionSource> Inner<P> {
    fn is_current(&self, trigger: Trigger) -> bool {
        self.generation.load(Ordering::Acquire) == trigger.generation
    }

    async fn poll(self: &Arc<Self>, trigger: Trigger) -> PollOutcome {
        let Some(_guard) = PollGuard::acquire(&self.polling) else {
            debug!(trigger = trigger.kind.label(), "poll already in flight, skipping");
            return PollOutcome::Skipped;
        };

        lock(&self.state).last_poll_time = Some(Instant::now());
        let fetched = match tokio::time::timeout(self.config.fetch_timeout, self.source.fetch()).await
        {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.config.fetch_timeout)),
        };

        if !self.is_current(trigger) {
            debug!(trigger = trigger.kind.label(), "agent stopped during poll, discarding result");
            return PollOutcome::Skipped;
        }

        match fetched {
            Ok(snapshot) => self.commit(snapshot),
            Err(err) => {
                self.handle_failure(&err, trigger);
                PollOutcome::Failed(err)
            }
        }
    }

    fn commit(&self, snapshot: ProgressionSnapshot) -> PollOutcome {
        match self.stage(&snapshot) {
            Some((diff, revision)) => {
                self.publish(revision, &diff, &snapshot);
                PollOutcome::Committed
            }
            None => PollOutcome::Unchanged,
        }
    }

    /// Fold a fetched snapshot into the mirror. Returns the diff against the
    /// previous confirmed snapshot and the new revision, or `None` when
    /// nothing changed.
    fn stage(&self, snapshot: &ProgressionSnapshot) -> Option<(SnapshotDiff, u64)> {
        let (diff, revision) = {
            let mut state = lock(&self.state);
            state.backoff.record_success();
            state.last_success_time = Some(Instant::now());
            state.last_retry_delay = None;

            let diff =
                SnapshotDiff::compute(state.confirmed.as_ref(), snapshot, self.config.collection_order);
            let overrides_prediction =
                state.provisional && state.last_snapshot.as_ref() != Some(snapshot);
            state.confirmed = Some(snapshot.clone());

            if !diff.changed && !overrides_prediction {
                state.provisional = false;
                return None;
            }

            if let Some(mirror) = state.last_snapshot.as_mut() {
                mirror.reconcile(snapshot);
            } else {
                state.last_snapshot = Some(snapshot.clone());
            }
            state.provisional = false;
            state.revision += 1;
            (diff, state.revision)
        };

        debug!(
            level = snapshot.level,
            score = snapshot.score,
            badges = snapshot.badges.len(),
            first_load = diff.first_load,
            "progression snapshot committed"
        );
        Some((diff, revision))
    }

    /// Broadcast a staged commit.
    ///
    /// `confirmed` already moved past this diff, so its semantic events are
    /// sent even when a newer revision (an optimistic update) got broadcast
    /// first. Only the snapshot itself is withheld then.
    fn publish(&self, revision: u64, diff: &SnapshotDiff, snapshot: &ProgressionSnapshot) {
        let current = self.dispatch_update(revision, snapshot);
        for event in ProgressionEvent::from_diff(diff, snapshot) {
            if !current && matches!(event, ProgressionEvent::ProgressionUpdated(_)) {
                continue;
            }
            self.dispatch_event(event);
        }
    }

    /// Run update callbacks unless a newer revision was already broadcast.
    fn dispatch_update(&self, revision: u64, snapshot: &ProgressionSnapshot) -> bool {
        if self.dispatched.fetch_max(revision, Ordering::AcqRel) > revision {
            debug!(revision, "superseded snapshot not broadcast");
            return false;
        }

        let callbacks = lock(&self.updates).snapshot();
        for callback in callbacks {
            invoke_isolated("update", || callback(snapshot));
        }
        true
    }

    fn dispatch_event(&self, event: ProgressionEvent) {
        let listeners = lock(&self.listeners).snapshot();
        for listener in listeners {
            invoke_isolated("event", || listener(&event));
        }
        // No receiver is not an error.
        let _ = self.events.send(event);
    }

    fn handle_failure(self: &Arc<Self>, err: &SourceError, trigger: Trigger) {
        let decision = {
            let mut state = lock(&self.state);
            let decision = state.backoff.record_failure();
            match decision {
                RetryDecision::Retry { delay, .. } => state.last_retry_delay = Some(delay),
                RetryDecision::GiveUp => {
                    state.last_retry_delay = None;
                    state.terminal_failures += 1;
                }
            }
            decision
        };

        match decision {
            RetryDecision::Retry { attempt, delay } => {
                warn!(
                    error = %err,
                    trigger = trigger.kind.label(),
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    "progression poll failed, retrying"
                );
                self.schedule(
                    delay,
                    Trigger {
                        kind: TriggerKind::Retry,
                        generation: trigger.generation,
                    },
                );
            }
            RetryDecision::GiveUp => {
                error!(
                    error = %err,
                    max_retries = self.config.max_retries,
                    "progression sync failed, giving up"
                );
                match self.config.recovery {
                    RecoveryPolicy::Reload { delay } => {
                        self.notifications
                            .notify(Notification::error(TERMINAL_MESSAGE_RELOAD).persistent());
                        self.schedule(
                            delay,
                            Trigger {
                                kind: TriggerKind::Recovery,
                                generation: trigger.generation,
                            },
                        );
                    }
                    RecoveryPolicy::Disabled => {
                        self.notifications
                            .notify(Notification::error(TERMINAL_MESSAGE).persistent());
                    }
                }
            }
        }
    }

    fn schedule(self: &Arc<Self>, delay: Duration, trigger: Trigger) {
        let agent = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = agent.upgrade() else {
                return;
            };
            if !inner.is_current(trigger) {
                return;
            }
            if trigger.kind == TriggerKind::Recovery {
                inner.recover(trigger).await;
            } else {
                inner.poll(trigger).await;
            }
        });

        let mut timers = lock(&self.timers);
        timers.pending.retain(|h| !h.is_finished());
        timers.pending.push(handle);
    }

    async fn recover(self: &Arc<Self>, trigger: Trigger) {
        if let Some(hook) = &self.recovery_hook {
            info!("running recovery hook");
            hook.recover();
            return;
        }

        info!("reloading progression mirror");
        lock(&self.state).reset_mirror();
        self.poll(trigger).await;
    }
}
