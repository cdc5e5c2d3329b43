//! Snapshot diffing.
//!
//! Decides whether a freshly polled snapshot differs from the mirror and, if
//! so, which semantic deltas (level-up, new badges, ...) it carries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::snapshot::ProgressionSnapshot;

/// How the badge sequence is compared when detecting a change.
///
/// Added badges are always computed by set difference, whatever the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOrder {
    /// Reordering alone counts as a change.
    Ordered,
    /// Only membership matters.
    #[default]
    Unordered,
}

/// Difference between the previous mirror and a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Whether anything observable changed.
    pub changed: bool,
    /// There was no previous snapshot.
    pub first_load: bool,
    /// New level, present only when the level increased.
    pub level_up: Option<u32>,
    /// Badges absent from the previous snapshot, in new-sequence order.
    pub new_badges: Vec<String>,
    /// Achievements absent from the previous snapshot, sorted.
    pub new_achievements: Vec<String>,
    /// Score gain, present only when the score increased.
    pub score_increase: Option<u64>,
}

impl SnapshotDiff {
    /// Compute the diff from `old` to `new`.
    ///
    /// A missing `old` is a first load: it counts as changed but carries no
    /// per-category deltas, so existing badges are not re-announced.
    pub fn compute(
        old: Option<&ProgressionSnapshot>,
        new: &ProgressionSnapshot,
        order: CollectionOrder,
    ) -> Self {
        let Some(old) = old else {
            return Self {
                changed: true,
                first_load: true,
                ..Self::default()
            };
        };

        let changed = old.level != new.level
            || old.xp != new.xp
            || old.score != new.score
            || old.coins != new.coins
            || !badges_equal(&old.badges, &new.badges, order)
            || old.achievements_unlocked != new.achievements_unlocked
            || old.missions_completed != new.missions_completed
            || old.skills != new.skills
            || old.stats != new.stats;

        if !changed {
            return Self::default();
        }

        let new_badges = new
            .badges
            .iter()
            .filter(|badge| !old.badges.contains(badge))
            .cloned()
            .collect();

        let new_achievements = new
            .achievements_unlocked
            .difference(&old.achievements_unlocked)
            .cloned()
            .collect();

        Self {
            changed,
            first_load: false,
            level_up: (new.level > old.level).then_some(new.level),
            new_badges,
            new_achievements,
            score_increase: (new.score > old.score).then(|| new.score - old.score),
        }
    }

    /// Whether the diff carries any per-category delta.
    pub fn has_deltas(&self) -> bool {
        self.level_up.is_some()
            || !self.new_badges.is_empty()
            || !self.new_achievements.is_empty()
            || self.score_increase.is_some()
    }
}

fn badges_equal(old: &[String], new: &[String], order: CollectionOrder) -> bool {
    match order {
        CollectionOrder::Ordered => old == new,
        CollectionOrder::Unordered => {
            let old: BTreeSet<&String> = old.iter().collect();
            let new: BTreeSet<&String> = new.iter().collect();
            old == new
        }
    }
}
