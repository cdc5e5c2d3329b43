//! Default tuning values for the progression sync agent and notifications.
//!
//! Every value here is only a default: the matching field on
//! [`AgentConfig`](crate::config::AgentConfig) or
//! [`DedupConfig`](crate::notify::DedupConfig) overrides it.

use std::time::Duration;

// =============================================================================
// POLLING
// =============================================================================

/// Interval between two periodic progression polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound on a single progression fetch. A timeout counts as a failure.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Retries (after 1, 2, 3 poll intervals) before the failure is surfaced to
/// the player.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the last-resort recovery runs after a terminal failure.
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_secs(3);

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Minimum spacing between any two displayed notifications.
pub const DEFAULT_NOTIFICATION_COOLDOWN: Duration = Duration::from_millis(2000);

/// Window in which the same normalized text is treated as a duplicate.
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_millis(3000);

/// Age after which a notification record is swept.
pub const DEFAULT_HISTORY_RETENTION: Duration = Duration::from_secs(300);

/// Maximum number of retained notification records.
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;

/// Interval of the background history sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// HTTP SOURCE
// =============================================================================

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Progression endpoint (`{ success, progression }`).
pub const PATH_PROGRESSION_DATA: &str = "/api/progression/data";

/// Legacy sync endpoint (`{ success, player_data }`).
pub const PATH_SYNC_PROGRESSION: &str = "/api/sync-progression";

/// Legacy dashed endpoint (`{ success, progression }`).
pub const PATH_PROGRESSION_DATA_LEGACY: &str = "/api/progression-data";

// =============================================================================
// CLIENT STORAGE KEYS
// =============================================================================

/// Set once the onboarding tutorial has been completed.
pub const KEY_TUTORIAL_COMPLETED: &str = "arkalia_tutorial_completed";

/// Selected UI theme.
pub const KEY_THEME: &str = "arkalia_theme";

/// Cached player interactions used for profile inference.
pub const KEY_PLAYER_INTERACTIONS: &str = "arkalia_player_interactions";
