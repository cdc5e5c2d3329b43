//! Optimistic local updates.

use serde::{Deserialize, Serialize};

use super::snapshot::ProgressionSnapshot;

/// A change a local action is known to have caused before the next poll
/// confirms it.
///
/// Only these kinds are accepted; the wire form is tagged by `type`
/// (`score_earned`, `level_up`, `badge_earned`) and any other tag fails to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocalDelta {
    /// Points earned by a local action.
    ScoreEarned {
        /// Points added to the score.
        points: u64,
    },
    /// The player reached a new level.
    LevelUp {
        /// The level reached.
        new_level: u32,
    },
    /// A badge was earned.
    BadgeEarned {
        /// Badge name.
        badge: String,
    },
}

impl LocalDelta {
    /// Wire name of this kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LocalDelta::ScoreEarned { .. } => "score_earned",
            LocalDelta::LevelUp { .. } => "level_up",
            LocalDelta::BadgeEarned { .. } => "badge_earned",
        }
    }

    /// Apply the change in place.
    pub fn apply_to(&self, snapshot: &mut ProgressionSnapshot) {
        match self {
            LocalDelta::ScoreEarned { points } => {
                snapshot.score = snapshot.score.saturating_add(*points);
            }
            LocalDelta::LevelUp { new_level } => {
                snapshot.level = *new_level;
            }
            LocalDelta::BadgeEarned { badge } => {
                if !snapshot.has_badge(badge) {
                    snapshot.badges.push(badge.clone());
                }
            }
        }
    }
}
