//! Rule-based player profile inference.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interactions after which a player is experienced regardless of time.
pub const EXPERIENCED_INTERACTIONS: u64 = 200;

/// Play time after which a player is experienced regardless of activity.
pub const EXPERIENCED_ELAPSED: Duration = Duration::from_secs(10 * 60 * 60);

/// Below this many interactions (and [`BEGINNER_ELAPSED`]) a player is new.
pub const BEGINNER_INTERACTIONS: u64 = 10;

/// Below this play time (and [`BEGINNER_INTERACTIONS`]) a player is new.
pub const BEGINNER_ELAPSED: Duration = Duration::from_secs(15 * 60);

/// Coarse play style, used to adapt hints and tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerProfile {
    /// Just started.
    #[default]
    Debutant,
    /// Chases score and leaderboard position.
    Competitif,
    /// Plays without a strong focus.
    Casual,
    /// Spends time customizing.
    Creatif,
    /// Long-time player.
    Experimente,
}

impl PlayerProfile {
    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerProfile::Debutant => "debutant",
            PlayerProfile::Competitif => "competitif",
            PlayerProfile::Casual => "casual",
            PlayerProfile::Creatif => "creatif",
            PlayerProfile::Experimente => "experimente",
        }
    }
}

impl fmt::Display for PlayerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviors observed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorFlags {
    /// Looked at the leaderboard or score details.
    pub competitive: bool,
    /// Used customization (themes, avatar).
    pub creative: bool,
}

/// Input to [`classify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionSummary {
    /// Interactions recorded.
    pub interactions: u64,
    /// Time since the first recorded interaction.
    pub elapsed: Duration,
    /// Observed behaviors.
    pub flags: BehaviorFlags,
}

/// Infer a profile. Rules apply in order, first match wins:
///
/// 1. many interactions or long play time: `Experimente`
/// 2. few interactions and short play time: `Debutant`
/// 3. competitive behavior: `Competitif`
/// 4. creative behavior: `Creatif`
/// 5. otherwise `Casual`
pub fn classify(summary: &InteractionSummary) -> PlayerProfile {
    if summary.interactions >= EXPERIENCED_INTERACTIONS || summary.elapsed >= EXPERIENCED_ELAPSED {
        PlayerProfile::Experimente
    } else if summary.interactions < BEGINNER_INTERACTIONS && summary.elapsed < BEGINNER_ELAPSED {
        PlayerProfile::Debutant
    } else if summary.flags.competitive {
        PlayerProfile::Competitif
    } else if summary.flags.creative {
        PlayerProfile::Creatif
    } else {
        PlayerProfile::Casual
    }
}
