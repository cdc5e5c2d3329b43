//! # Arkalia sync
//!
//! Client-side progression synchronization for Arkalia Quest.
//!
//! A [`ProgressionSyncAgent`] keeps an eventually-consistent mirror of the
//! player's server-side progression (level, score, badges, achievements) and
//! turns every observed change into typed [`ProgressionEvent`]s. A
//! [`NotificationCenter`] renders user-facing notifications without spamming
//! the player: a global cooldown, a duplicate window and a bounded history
//! decide what is shown.
//!
//! - **Polling**: one periodic poller per agent, polls never overlap
//! - **Deltas**: level-up, new badges and achievements, score increase
//! - **Resilience**: linear retry backoff, terminal notification, recovery
//! - **Optimism**: local predictions shown at once, server state always wins
//!
//! ## Feature Flags
//!
//! - `http` (default): [`HttpProgressionSource`] on `reqwest`
//! - `config-file` (default): load [`ArkaliaConfig`] from TOML
//!
//! ## Modules
//!
//! - [`core`]: Core traits, constants, and error types
//! - [`progression`]: Snapshot model, diffing, optimistic deltas
//! - [`sync`]: The sync agent, events and retry policy
//! - [`notify`]: Deduplication, notification center, event announcer
//! - [`source`]: Endpoint decoding and the HTTP source
//! - [`profile`]: Player profile inference
//! - [`storage`]: Client-side key/value storage
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use arkalia_sync::prelude::*;
//!
//! # async fn run() -> Result<(), ArkaliaError> {
//! let config = ArkaliaConfig::default();
//! let source = HttpProgressionSource::new(&config.source)?;
//! let center = Arc::new(NotificationCenter::tracing(config.notifications.clone()));
//!
//! let agent = ProgressionSyncAgent::builder(source)
//!     .config(config.agent.clone())
//!     .notifications(center.clone())
//!     .build();
//! attach_announcer(&agent, center);
//!
//! agent.start(config.agent.poll_interval);
//! agent.apply_optimistic_local_update(LocalDelta::ScoreEarned { points: 50 }).ok();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod config;
pub mod notify;
pub mod profile;
pub mod progression;
pub mod source;
pub mod storage;
pub mod sync;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and types
    pub use crate::core::*;

    pub use crate::config::{AgentConfig, ArkaliaConfig, DedupConfig, RecoveryPolicy, SourceConfig};
    pub use crate::notify::{
        Notification, NotificationCenter, NotificationLevel, NotificationSink, QueueSink,
        TracingSink, announce, attach_announcer,
    };
    pub use crate::profile::{InteractionKind, InteractionTracker, PlayerProfile, classify};
    pub use crate::progression::{CollectionOrder, LocalDelta, ProgressionSnapshot, SnapshotDiff};
    pub use crate::source::Endpoint;
    #[cfg(feature = "http")]
    pub use crate::source::HttpProgressionSource;
    pub use crate::storage::{ClientStore, ClientStoreExt, JsonFileStore, MemoryStore};
    pub use crate::sync::{
        AgentStatus, EventHandle, PollOutcome, ProgressionEvent, ProgressionSyncAgent,
        UpdateHandle,
    };
}

// Re-export commonly used items at crate root
pub use config::ArkaliaConfig;
pub use core::{ArkaliaError, ProgressionSource, SourceError, SyncError};
pub use notify::{NotificationCenter, NotificationDeduplicator};
pub use progression::{LocalDelta, ProgressionSnapshot};
pub use sync::{ProgressionEvent, ProgressionSyncAgent};

#[cfg(feature = "http")]
pub use source::HttpProgressionSource;
