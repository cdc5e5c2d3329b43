//! Arkalia Watch
//!
//! Polls the progression backend, logs every progression event, announces
//! level-ups and badges, and serves the agent status over HTTP.
//!
//! Environment variables:
//! - ARKALIA_CONFIG: TOML configuration file (optional)
//! - ARKALIA_BASE_URL, ARKALIA_ENDPOINT, ARKALIA_POLL_INTERVAL_MS,
//!   ARKALIA_FETCH_TIMEOUT_MS, ARKALIA_RELOAD_ON_FAILURE: config overrides
//! - ARKALIA_HEALTH_ADDR: health server address (default 127.0.0.1:8080)
//! - ARKALIA_LOG: log filter (default info)

mod health;

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use arkalia_sync::core::{ConfigError, SourceError};
use arkalia_sync::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use health::{HealthState, start_health_server};

const DEFAULT_HEALTH_ADDR: &str = "127.0.0.1:8080";
const HEALTH_REFRESH: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
enum WatchError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("progression source: {0}")]
    Source(#[from] SourceError),

    #[error("invalid ARKALIA_HEALTH_ADDR: {0}")]
    HealthAddr(#[from] AddrParseError),
}

fn load_config() -> Result<ArkaliaConfig, ConfigError> {
    let mut config = match std::env::var("ARKALIA_CONFIG") {
        Ok(path) => {
            info!(%path, "loading configuration");
            ArkaliaConfig::load(path)?
        }
        Err(_) => ArkaliaConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), WatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ARKALIA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let health_addr: SocketAddr = std::env::var("ARKALIA_HEALTH_ADDR")
        .unwrap_or_else(|_| DEFAULT_HEALTH_ADDR.to_string())
        .parse()?;

    let source = HttpProgressionSource::new(&config.source)?;
    info!(url = source.url(), "watching progression");

    let center = Arc::new(NotificationCenter::tracing(config.notifications.clone()));
    let sweeper = center.spawn_sweeper();

    let agent = ProgressionSyncAgent::builder(source)
        .config(config.agent.clone())
        .notifications(center.clone())
        .build();
    attach_announcer(&agent, center);

    let mut events = agent.subscribe_events();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    info!(event = event.name(), %payload, "progression event");
                }
                Err(RecvError::Lagged(missed)) => warn!(missed, "event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let health = HealthState::new();
    let server_state = health.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = start_health_server(health_addr, server_state).await {
            warn!(error = %e, "health server stopped");
        }
    });

    let watched = agent.clone();
    let refresher = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HEALTH_REFRESH);
        loop {
            ticker.tick().await;
            let level = watched.snapshot().map(|s| s.level);
            health.update(watched.status(), level).await;
        }
    });

    agent.start(config.agent.poll_interval);

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, shutting down");
    }
    info!("shutting down");

    agent.stop();
    refresher.abort();
    server.abort();
    sweeper.abort();
    logger.abort();
    Ok(())
}
