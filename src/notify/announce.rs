//! Routes progression events to user-facing notifications.

use std::sync::Arc;

use super::center::{Notification, NotificationCenter};
use crate::core::ProgressionSource;
use crate::sync::{EventHandle, ProgressionEvent, ProgressionSyncAgent};

/// Notification for an event, if it deserves one.
///
/// `progression-updated` and `score-increased` are silent; the widgets
/// already show them.
pub fn announce(event: &ProgressionEvent) -> Option<Notification> {
    match event {
        ProgressionEvent::LevelUp { level } => {
            Some(Notification::success(format!("Level {level} reached!")))
        }
        ProgressionEvent::BadgeUnlocked { name } => {
            Some(Notification::success(format!("Badge unlocked: {name}")))
        }
        ProgressionEvent::AchievementUnlocked { name } => {
            Some(Notification::success(format!("Achievement unlocked: {name}")))
        }
        ProgressionEvent::ProgressionUpdated(_) | ProgressionEvent::ScoreIncreased { .. } => None,
    }
}

/// Announce every event of `agent` through `center`.
pub fn attach_announcer<P: ProgressionSource>(
    agent: &ProgressionSyncAgent<P>,
    center: Arc<NotificationCenter>,
) -> EventHandle {
    agent.on_event(move |event| {
        if let Some(notification) = announce(event) {
            center.notify(notification);
        }
        Ok(())
    })
}
