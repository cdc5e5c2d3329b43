//! Arkalia sync - Notifications
//!
//! Implements:
//! - Notification deduplication (cooldown, duplicate window, bounded history)
//! - The notification center and its sinks
//! - Announcing progression events as notifications

mod announce;
mod center;
mod dedup;

pub use announce::*;
pub use center::*;
pub use dedup::*;

pub use crate::config::DedupConfig;
