//! HTTP source against a mock backend.

#![cfg(feature = "http")]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use arkalia_sync::prelude::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Backend {
    level: Arc<AtomicU32>,
}

async fn progression_data(State(backend): State<Backend>) -> Json<Value> {
    let level = backend.level.load(Ordering::SeqCst);
    Json(json!({
        "success": true,
        "progression": {
            "level": level,
            "score": 150,
            "badges": ["first_blood", "first_blood", "explorer"],
            "achievementsUnlocked": ["tutorial"],
        }
    }))
}

async fn sync_progression() -> Json<Value> {
    Json(json!({
        "success": true,
        "player_data": { "level": 2, "xp": 40, "coins": 12 }
    }))
}

async fn legacy_progression() -> Json<Value> {
    Json(json!({
        "success": false,
        "error": "session expired"
    }))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn spawn_backend(backend: Backend) -> SocketAddr {
    let app = Router::new()
        .route("/api/progression/data", get(progression_data))
        .route("/api/sync-progression", get(sync_progression))
        .route("/api/progression-data", get(legacy_progression))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn source_for(addr: SocketAddr, endpoint: Endpoint) -> HttpProgressionSource {
    HttpProgressionSource::new(&SourceConfig {
        base_url: format!("http://{addr}"),
        endpoint,
        ..SourceConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_progression_data_endpoint() {
    let backend = Backend::default();
    backend.level.store(3, Ordering::SeqCst);
    let addr = spawn_backend(backend).await;

    let snapshot = source_for(addr, Endpoint::ProgressionData).fetch().await.unwrap();
    assert_eq!(snapshot.level, 3);
    assert_eq!(snapshot.score, 150);
    assert_eq!(snapshot.badges, vec!["first_blood", "explorer"]);
    assert!(snapshot.achievements_unlocked.contains("tutorial"));
}

#[tokio::test]
async fn test_sync_progression_endpoint() {
    let addr = spawn_backend(Backend::default()).await;

    let snapshot = source_for(addr, Endpoint::SyncProgression).fetch().await.unwrap();
    assert_eq!(snapshot.level, 2);
    assert_eq!(snapshot.xp, 40);
    assert_eq!(snapshot.coins, 12);
}

#[tokio::test]
async fn test_success_false_is_malformed() {
    let addr = spawn_backend(Backend::default()).await;

    let err = source_for(addr, Endpoint::ProgressionDataLegacy)
        .fetch()
        .await
        .unwrap_err();
    assert_eq!(err, SourceError::Malformed("session expired".into()));
}

#[tokio::test]
async fn test_non_success_status() {
    let app = Router::new().route("/api/progression/data", get(broken));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let err = source_for(addr, Endpoint::ProgressionData).fetch().await.unwrap_err();
    assert_eq!(err, SourceError::Status(500));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source_for(addr, Endpoint::ProgressionData).fetch().await.unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    // Accepts connections but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let limit = Duration::from_millis(200);
    let client = reqwest::Client::builder().timeout(limit).build().unwrap();
    let source = HttpProgressionSource::with_client(
        client,
        &SourceConfig {
            base_url: format!("http://{addr}"),
            connect_timeout: limit,
            ..SourceConfig::default()
        },
    );

    let err = source.fetch().await.unwrap_err();
    assert_eq!(err, SourceError::Timeout(limit));
    assert!(err.to_string().contains("200ms"));
}

#[tokio::test]
async fn test_agent_emits_level_up_from_backend() {
    let backend = Backend::default();
    backend.level.store(1, Ordering::SeqCst);
    let addr = spawn_backend(backend.clone()).await;

    let agent = ProgressionSyncAgent::new(
        source_for(addr, Endpoint::ProgressionData),
        AgentConfig::builder()
            .poll_interval(Duration::from_secs(30))
            .build(),
    );
    let mut events = agent.subscribe_events();

    assert_eq!(agent.force_sync().await, PollOutcome::Committed);
    backend.level.store(2, Ordering::SeqCst);
    assert_eq!(agent.force_sync().await, PollOutcome::Committed);
    assert_eq!(agent.force_sync().await, PollOutcome::Unchanged);

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.name());
    }
    assert_eq!(names, vec!["progression-updated", "progression-updated", "level-up"]);
}
