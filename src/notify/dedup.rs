//! Notification deduplication.
//!
//! Three rules decide whether a notification is rendered:
//! - a global cooldown between any two displayed notifications
//! - a duplicate window for identical normalized text
//! - a bounded, time-swept history of what was shown

use std::collections::VecDeque;

use tokio::time::Instant;
use uuid::Uuid;

use crate::config::DedupConfig;

/// Normalize notification text for duplicate detection.
///
/// Lowercases, drops punctuation and collapses whitespace, so
/// `"Badge Obtenu!"` and `"badge   obtenu"` compare equal.
pub fn normalize(message: &str) -> String {
    let kept: String = message
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .flat_map(char::to_lowercase)
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One previously shown notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Normalized text.
    pub normalized_message: String,
    /// When it was shown.
    pub timestamp: Instant,
    /// Unique record id.
    pub id: String,
}

/// Decides whether a candidate notification should be rendered.
#[derive(Debug, Clone)]
pub struct NotificationDeduplicator {
    config: DedupConfig,
    /// Oldest first.
    records: VecDeque<NotificationRecord>,
    last_shown: Option<Instant>,
}

impl NotificationDeduplicator {
    /// Create a deduplicator.
    pub fn new(config: DedupConfig) -> Self {
        Self {
            records: VecDeque::with_capacity(config.max_history_size),
            config,
            last_shown: None,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Decide whether `message` may be shown at `timestamp`, recording it if
    /// so.
    pub fn should_show(&mut self, message: &str, timestamp: Instant) -> bool {
        self.sweep(timestamp);

        if let Some(last) = self.last_shown {
            if timestamp.saturating_duration_since(last) < self.config.cooldown {
                return false;
            }
        }

        let normalized = normalize(message);
        let duplicate = self.records.iter().any(|record| {
            record.normalized_message == normalized
                && timestamp.saturating_duration_since(record.timestamp)
                    < self.config.duplicate_window
        });
        if duplicate {
            return false;
        }

        self.push(normalized, timestamp);
        true
    }

    /// Record `message` as shown without any check.
    ///
    /// Used for notifications that must never be suppressed; they still start
    /// a cooldown and count as a duplicate for later messages.
    pub fn record(&mut self, message: &str, timestamp: Instant) -> &NotificationRecord {
        self.sweep(timestamp);
        self.push(normalize(message), timestamp)
    }

    /// Drop records older than the retention window.
    pub fn sweep(&mut self, now: Instant) {
        let retention = self.config.retention;
        self.records
            .retain(|record| now.saturating_duration_since(record.timestamp) <= retention);
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    /// When the last notification was shown.
    pub fn last_shown(&self) -> Option<Instant> {
        self.last_shown
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.records.clear();
        self.last_shown = None;
    }

    fn push(&mut self, normalized_message: String, timestamp: Instant) -> &NotificationRecord {
        self.last_shown = Some(match self.last_shown {
            Some(last) if last > timestamp => last,
            _ => timestamp,
        });

        let capacity = self.config.max_history_size.max(1);
        while self.records.len() >= capacity {
            self.records.pop_front();
        }
        self.records.push_back(NotificationRecord {
            normalized_message,
            timestamp,
            id: Uuid::new_v4().to_string(),
        });
        &self.records[self.records.len() - 1]
    }
}

impl Default for NotificationDeduplicator {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}
