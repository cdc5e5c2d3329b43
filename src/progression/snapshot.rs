//! Progression snapshot.
//!
//! The player's last-known progression as reported by the backend. Snapshots
//! are replaced wholesale on every successful poll.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Deserializer, Serialize};

use super::delta::LocalDelta;
use crate::core::Predictable;

/// Complete server-reported player progression at one point in time.
///
/// Deserialization is lenient: absent fields default to zero or empty and the
/// camelCase spellings used by older endpoints are accepted. Negative numbers
/// are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSnapshot {
    /// Player level.
    pub level: u32,
    /// Experience points.
    pub xp: u64,
    /// Total score.
    pub score: u64,
    /// Coin balance.
    pub coins: u64,
    /// Badge names in the order the backend reports them. Unique.
    #[serde(deserialize_with = "unique_in_order")]
    pub badges: Vec<String>,
    /// Unlocked achievement names.
    #[serde(alias = "achievementsUnlocked", alias = "achievements")]
    pub achievements_unlocked: BTreeSet<String>,
    /// Completed mission identifiers.
    #[serde(alias = "missionsCompleted")]
    pub missions_completed: BTreeSet<String>,
    /// Skill name to skill level.
    pub skills: BTreeMap<String, u32>,
    /// Free-form counters (commands run, challenges solved, ...).
    pub stats: BTreeMap<String, u64>,
}

impl ProgressionSnapshot {
    /// Create an empty snapshot (level 0, nothing unlocked).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the score.
    pub fn with_score(mut self, score: u64) -> Self {
        self.score = score;
        self
    }

    /// Set the experience points.
    pub fn with_xp(mut self, xp: u64) -> Self {
        self.xp = xp;
        self
    }

    /// Set the coin balance.
    pub fn with_coins(mut self, coins: u64) -> Self {
        self.coins = coins;
        self
    }

    /// Replace the badge sequence. Duplicates keep their first position.
    pub fn with_badges<I, T>(mut self, badges: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.badges = dedup_in_order(badges.into_iter().map(Into::into));
        self
    }

    /// Replace the unlocked achievements.
    pub fn with_achievements<I, T>(mut self, achievements: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.achievements_unlocked = achievements.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the player holds the named badge.
    pub fn has_badge(&self, name: &str) -> bool {
        self.badges.iter().any(|b| b == name)
    }
}

impl Predictable for ProgressionSnapshot {
    type Input = LocalDelta;

    fn predict(&mut self, input: &LocalDelta) {
        input.apply_to(self);
    }

    fn reconcile(&mut self, authoritative: &Self) {
        // Server truth replaces the prediction, it is never merged.
        self.clone_from(authoritative);
    }
}

fn dedup_in_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

fn unique_in_order<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(dedup_in_order(raw.unwrap_or_default().into_iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = ProgressionSnapshot::new();
        assert_eq!(snapshot.level, 0);
        assert!(snapshot.badges.is_empty());
        assert!(snapshot.achievements_unlocked.is_empty());
    }

    #[test]
    fn test_deserialize_missing_fields_default() {
        let snapshot: ProgressionSnapshot =
            serde_json::from_str(r#"{"level": 4, "score": 120}"#).unwrap();
        assert_eq!(snapshot.level, 4);
        assert_eq!(snapshot.score, 120);
        assert_eq!(snapshot.xp, 0);
        assert!(snapshot.skills.is_empty());
    }

    #[test]
    fn test_deserialize_camel_case_aliases() {
        let json = r#"{
            "level": 2,
            "achievementsUnlocked": ["hacker", "explorer"],
            "missionsCompleted": ["tutorial"]
        }"#;
        let snapshot: ProgressionSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.achievements_unlocked.contains("hacker"));
        assert!(snapshot.missions_completed.contains("tutorial"));
    }

    #[test]
    fn test_deserialize_null_badges() {
        let snapshot: ProgressionSnapshot = serde_json::from_str(r#"{"badges": null}"#).unwrap();
        assert!(snapshot.badges.is_empty());
    }

    #[test]
    fn test_duplicate_badges_keep_first_position() {
        let snapshot: ProgressionSnapshot =
            serde_json::from_str(r#"{"badges": ["a", "b", "a", "c", "b"]}"#).unwrap();
        assert_eq!(snapshot.badges, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_negative_numbers_rejected() {
        let result = serde_json::from_str::<ProgressionSnapshot>(r#"{"score": -5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_reconcile_overwrites_prediction() {
        let mut local = ProgressionSnapshot::new().with_score(10);
        local.predict(&LocalDelta::ScoreEarned { points: 40 });
        assert_eq!(local.score, 50);

        let server = ProgressionSnapshot::new().with_score(35).with_badges(["first_blood"]);
        local.reconcile(&server);
        assert_eq!(local, server);
    }
}
