//! Interaction tracking with persistence.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classify::{BehaviorFlags, InteractionSummary, PlayerProfile, classify};
use crate::core::StorageError;
use crate::core::constants::KEY_PLAYER_INTERACTIONS;
use crate::storage::{ClientStore, ClientStoreExt};

/// Kind of player interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// A terminal command or challenge action.
    Command,
    /// Opened the leaderboard or score details.
    Leaderboard,
    /// Changed theme, avatar or other cosmetics.
    Customization,
    /// Anything else.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredInteractions {
    count: u64,
    first_seen: DateTime<Utc>,
    #[serde(default)]
    flags: BehaviorFlags,
}

impl StoredInteractions {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            first_seen: now,
            flags: BehaviorFlags::default(),
        }
    }
}

/// Counts interactions and infers a [`PlayerProfile`].
///
/// State is written to the store under
/// [`KEY_PLAYER_INTERACTIONS`] after every change and restored on
/// construction.
#[derive(Debug)]
pub struct InteractionTracker<S> {
    store: S,
    state: StoredInteractions,
}

impl<S: ClientStore> InteractionTracker<S> {
    /// Restore from `store`, or start fresh if nothing usable is stored.
    pub fn restore(store: S) -> Result<Self, StorageError> {
        let state = match store.get_json::<StoredInteractions>(KEY_PLAYER_INTERACTIONS) {
            Ok(Some(state)) => {
                debug!(count = state.count, "player interactions restored");
                state
            }
            Ok(None) => StoredInteractions::fresh(Utc::now()),
            Err(StorageError::Serialization(err)) => {
                warn!(error = %err, "discarding unreadable player interactions");
                StoredInteractions::fresh(Utc::now())
            }
            Err(err) => return Err(err),
        };
        Ok(Self { store, state })
    }

    /// Record one interaction and persist.
    pub fn record(&mut self, kind: InteractionKind) -> Result<(), StorageError> {
        self.state.count = self.state.count.saturating_add(1);
        match kind {
            InteractionKind::Leaderboard => self.state.flags.competitive = true,
            InteractionKind::Customization => self.state.flags.creative = true,
            InteractionKind::Command | InteractionKind::Other => {}
        }
        self.persist()
    }

    /// Interactions recorded so far.
    pub fn count(&self) -> u64 {
        self.state.count
    }

    /// When the first interaction was tracked.
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.state.first_seen
    }

    /// Summary as of `now`.
    pub fn summary_at(&self, now: DateTime<Utc>) -> InteractionSummary {
        InteractionSummary {
            interactions: self.state.count,
            elapsed: (now - self.state.first_seen)
                .to_std()
                .unwrap_or(Duration::ZERO),
            flags: self.state.flags,
        }
    }

    /// Summary as of now.
    pub fn summary(&self) -> InteractionSummary {
        self.summary_at(Utc::now())
    }

    /// Inferred profile as of now.
    pub fn profile(&self) -> PlayerProfile {
        classify(&self.summary())
    }

    /// Forget everything and remove the stored state.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.state = StoredInteractions::fresh(Utc::now());
        self.store.remove(KEY_PLAYER_INTERACTIONS)
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.store.set_json(KEY_PLAYER_INTERACTIONS, &self.state)
    }
}
