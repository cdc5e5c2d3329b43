//! Health check endpoint.
//!
//! Serves the sync agent's status over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use arkalia_sync::sync::AgentStatus;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tokio::sync::RwLock;
use tracing::info;

/// Health status.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
    /// The last poll succeeded (no retry pending).
    pub healthy: bool,
    /// A snapshot has been mirrored.
    pub ready: bool,
    /// Last mirrored level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Agent status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentStatus>,
}

/// Shared state for health endpoint.
#[derive(Clone, Default)]
pub struct HealthState {
    inner: Arc<RwLock<HealthStateInner>>,
}

#[derive(Default)]
struct HealthStateInner {
    level: Option<u32>,
    agent: Option<AgentStatus>,
}

impl HealthState {
    /// Create health state before the first poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest agent status.
    pub async fn update(&self, agent: AgentStatus, level: Option<u32>) {
        let mut inner = self.inner.write().await;
        inner.agent = Some(agent);
        inner.level = level;
    }

    /// Get current status.
    pub async fn status(&self) -> HealthStatus {
        let inner = self.inner.read().await;
        let agent = inner.agent.clone();
        HealthStatus {
            healthy: agent.as_ref().is_none_or(|a| a.retry_count == 0),
            ready: agent.as_ref().is_some_and(|a| a.has_snapshot),
            level: inner.level,
            agent,
        }
    }
}

/// Health check handler.
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status().await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Readiness handler: ready once a snapshot is mirrored.
async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.status().await;
    let code = if status.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Liveness handler (always returns OK if server is running).
async fn live_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the health check server.
pub async fn start_health_server(
    bind_addr: SocketAddr,
    state: HealthState,
) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/live", get(live_handler))
        .with_state(state);

    info!(addr = %bind_addr, "health server listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_status(retry_count: u32, has_snapshot: bool) -> AgentStatus {
        AgentStatus {
            running: true,
            is_polling: false,
            has_snapshot,
            provisional: false,
            retry_count,
            last_retry_delay_ms: None,
            since_last_poll_ms: Some(10),
            since_last_success_ms: None,
            terminal_failures: 0,
        }
    }

    #[tokio::test]
    async fn test_health_state_before_first_poll() {
        let state = HealthState::new();
        let status = state.status().await;
        assert!(status.healthy);
        assert!(!status.ready);
        assert!(status.agent.is_none());
    }

    #[tokio::test]
    async fn test_update_ready() {
        let state = HealthState::new();
        state.update(agent_status(0, true), Some(4)).await;
        let status = state.status().await;
        assert!(status.ready);
        assert_eq!(status.level, Some(4));
    }

    #[tokio::test]
    async fn test_retrying_is_unhealthy() {
        let state = HealthState::new();
        state.update(agent_status(2, true), Some(4)).await;
        assert!(!state.status().await.healthy);
    }
}
