//! Per-agent synchronization state.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::retry::LinearBackoff;
use crate::progression::ProgressionSnapshot;

/// Mutable state owned by one agent.
///
/// `last_snapshot` is the mirror shown to subscribers and may carry an
/// optimistic prediction; `confirmed` is the last snapshot the server
/// actually returned and is the base for event deltas.
#[derive(Debug)]
pub(crate) struct SyncAgentState {
    pub(crate) last_snapshot: Option<ProgressionSnapshot>,
    pub(crate) confirmed: Option<ProgressionSnapshot>,
    pub(crate) provisional: bool,
    pub(crate) last_poll_time: Option<Instant>,
    pub(crate) last_success_time: Option<Instant>,
    pub(crate) backoff: LinearBackoff,
    pub(crate) last_retry_delay: Option<Duration>,
    pub(crate) terminal_failures: u64,
    /// Bumped on every mirror change, optimistic or confirmed.
    pub(crate) revision: u64,
}

impl SyncAgentState {
    pub(crate) fn new(poll_interval: Duration, max_retries: u32) -> Self {
        Self {
            last_snapshot: None,
            confirmed: None,
            provisional: false,
            last_poll_time: None,
            last_success_time: None,
            backoff: LinearBackoff::new(poll_interval, max_retries),
            last_retry_delay: None,
            terminal_failures: 0,
            revision: 0,
        }
    }

    /// Forget the mirror, as a page reload would.
    pub(crate) fn reset_mirror(&mut self) {
        self.last_snapshot = None;
        self.confirmed = None;
        self.provisional = false;
    }
}

/// Point-in-time view of an agent, for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    /// The periodic timer is active.
    pub running: bool,
    /// A poll is in flight.
    pub is_polling: bool,
    /// A snapshot has been received.
    pub has_snapshot: bool,
    /// The mirror carries an unconfirmed optimistic update.
    pub provisional: bool,
    /// Retries scheduled since the last success.
    pub retry_count: u32,
    /// Delay of the most recently scheduled retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_retry_delay_ms: Option<u64>,
    /// Milliseconds since the last poll started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_last_poll_ms: Option<u64>,
    /// Milliseconds since the last successful poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_last_success_ms: Option<u64>,
    /// Number of times the retry budget was exhausted.
    pub terminal_failures: u64,
}
