//! Progression events and subscriber registries.
//!
//! Events are a closed set of typed variants instead of string-keyed custom
//! events, so every listener gets a checked payload.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tracing::{error, warn};

use crate::core::SubscriberError;
use crate::progression::{ProgressionSnapshot, SnapshotDiff};

/// Semantic event emitted when the mirrored progression changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ProgressionEvent {
    /// A new snapshot was committed.
    ProgressionUpdated(ProgressionSnapshot),
    /// The level increased.
    LevelUp {
        /// Level reached.
        level: u32,
    },
    /// A badge appeared.
    BadgeUnlocked {
        /// Badge name.
        name: String,
    },
    /// An achievement appeared.
    AchievementUnlocked {
        /// Achievement name.
        name: String,
    },
    /// The score increased.
    ScoreIncreased {
        /// Points gained.
        delta: u64,
    },
}

impl ProgressionEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            ProgressionEvent::ProgressionUpdated(_) => "progression-updated",
            ProgressionEvent::LevelUp { .. } => "level-up",
            ProgressionEvent::BadgeUnlocked { .. } => "badge-unlocked",
            ProgressionEvent::AchievementUnlocked { .. } => "achievement-unlocked",
            ProgressionEvent::ScoreIncreased { .. } => "score-increased",
        }
    }

    /// Events for a committed change, in dispatch order:
    /// `progression-updated` first, then level, badges (in sequence order),
    /// achievements and score.
    pub fn from_diff(diff: &SnapshotDiff, snapshot: &ProgressionSnapshot) -> Vec<Self> {
        let mut events = Vec::with_capacity(
            2 + diff.new_badges.len() + diff.new_achievements.len() + 1,
        );
        events.push(ProgressionEvent::ProgressionUpdated(snapshot.clone()));

        if let Some(level) = diff.level_up {
            events.push(ProgressionEvent::LevelUp { level });
        }
        events.extend(
            diff.new_badges
                .iter()
                .map(|name| ProgressionEvent::BadgeUnlocked { name: name.clone() }),
        );
        events.extend(
            diff.new_achievements
                .iter()
                .map(|name| ProgressionEvent::AchievementUnlocked { name: name.clone() }),
        );
        if let Some(delta) = diff.score_increase {
            events.push(ProgressionEvent::ScoreIncreased { delta });
        }
        events
    }
}

/// Callback invoked with each committed snapshot.
pub type UpdateCallback =
    dyn Fn(&ProgressionSnapshot) -> Result<(), SubscriberError> + Send + Sync + 'static;

/// Callback invoked with each emitted event.
pub type EventCallback =
    dyn Fn(&ProgressionEvent) -> Result<(), SubscriberError> + Send + Sync + 'static;

/// Ordered set of callbacks with stable ids.
pub(crate) struct Registry<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<T>)>,
}

impl<T: ?Sized> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, callback: Arc<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Callbacks in registration order. Cloned so they can be invoked
    /// without holding the registry lock.
    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.iter().map(|(_, cb)| cb.clone()).collect()
    }
}

pub(crate) type SharedRegistry<T> = Arc<Mutex<Registry<T>>>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by a registration; call
/// [`unregister`](SubscriptionHandle::unregister) to remove the callback.
///
/// Dropping the handle keeps the callback registered.
pub struct SubscriptionHandle<T: ?Sized> {
    registry: Weak<Mutex<Registry<T>>>,
    id: u64,
}

impl<T: ?Sized> SubscriptionHandle<T> {
    pub(crate) fn new(registry: &SharedRegistry<T>, id: u64) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            id,
        }
    }

    /// Remove the callback. Returns `false` if it was already gone.
    pub fn unregister(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => lock(&registry).remove(self.id),
            None => false,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle").field("id", &self.id).finish()
    }
}

/// Handle for an [`on_update`](super::ProgressionSyncAgent::on_update) callback.
pub type UpdateHandle = SubscriptionHandle<UpdateCallback>;

/// Handle for an [`on_event`](super::ProgressionSyncAgent::on_event) callback.
pub type EventHandle = SubscriptionHandle<EventCallback>;

/// Run a callback, logging instead of propagating errors and panics.
pub(crate) fn invoke_isolated<F>(kind: &'static str, callback: F)
where
    F: FnOnce() -> Result<(), SubscriberError>,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(kind, error = %err, "subscriber failed"),
        Err(_) => error!(kind, "subscriber panicked"),
    }
}
