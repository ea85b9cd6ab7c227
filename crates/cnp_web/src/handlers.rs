use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use cnp_pipeline::CycleReport;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
pub struct DependencyHealth {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyHealth {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationMetrics {
    pub uptime_seconds: u64,
    pub posted_articles_count: usize,
    pub last_post_time: Option<DateTime<Utc>>,
    pub cycle_running: bool,
    pub last_cycle: Option<CycleReport>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub dependencies: Vec<DependencyHealth>,
    pub application: ApplicationMetrics,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub timestamp: DateTime<Utc>,
    pub dependencies: Vec<DependencyHealth>,
}

async fn check_dependencies(state: &AppState) -> Vec<DependencyHealth> {
    let Some(model) = &state.model else {
        return Vec::new();
    };

    let (status, error) = match tokio::time::timeout(HEALTH_TIMEOUT, model.health()).await {
        Ok(Ok(())) => ("healthy", None),
        Ok(Err(e)) => ("unhealthy", Some(e.to_string())),
        Err(_) => ("unhealthy", Some(format!("no answer within {}s", HEALTH_TIMEOUT.as_secs()))),
    };
    if let Some(error) = &error {
        warn!("Model backend {} is unhealthy: {}", model.name(), error);
    }
    vec![DependencyHealth {
        name: model.name().to_string(),
        status,
        error,
    }]
}

async fn application_metrics(state: &AppState) -> ApplicationMetrics {
    let stats = state.store.stats().await;
    let (cycle_running, last_cycle) = match &state.scheduler {
        Some(scheduler) => (scheduler.is_running(), scheduler.last_report().await),
        None => (false, None),
    };
    ApplicationMetrics {
        uptime_seconds: state.started_at.elapsed().as_secs(),
        posted_articles_count: stats.entries,
        last_post_time: stats.last_published_at,
        cycle_running,
        last_cycle,
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Crypto News Pipe Monitor",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health": "Health check with detailed status",
            "/metrics": "Application metrics",
            "/ready": "Readiness check for dependencies",
            "/": "This information page",
        },
        "timestamp": Utc::now(),
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let dependencies = check_dependencies(&state).await;
    let healthy = dependencies.iter().all(DependencyHealth::is_healthy);
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: Utc::now(),
        dependencies,
        application: application_metrics(&state).await,
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}

pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    let dependencies = check_dependencies(&state).await;
    let ready = dependencies.iter().all(DependencyHealth::is_healthy);
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(ReadyResponse {
            ready,
            timestamp: Utc::now(),
            dependencies,
        }),
    )
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<Value> {
    let application = application_metrics(&state).await;
    let dependencies = check_dependencies(&state).await;
    Json(json!({
        "application": application,
        "dependencies": dependencies,
    }))
}
