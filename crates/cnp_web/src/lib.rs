use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use cnp_core::Result;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve the monitor on `addr` until `cancel` fires.
pub async fn serve(addr: SocketAddr, state: AppState, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🩺 Monitor listening on http://{}", listener.local_addr()?);
    info!("🩺 Endpoints: /health /metrics /ready");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    info!("🩺 Monitor stopped");
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use cnp_core::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cnp_core::config::DedupConfig;
    use cnp_core::Error;
    use cnp_inference::models::{DummyModel, LanguageModel};
    use cnp_storage::DedupStore;
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct DownModel;

    #[async_trait]
    impl LanguageModel for DownModel {
        fn name(&self) -> &str {
            "Down"
        }

        async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            Err(Error::Inference("offline".into()))
        }

        async fn health(&self) -> Result<()> {
            Err(Error::Inference("connection refused".into()))
        }
    }

    async fn state(dir: &std::path::Path) -> AppState {
        let store = DedupStore::load(dir.join("posted.json"), DedupConfig::default()).await;
        AppState::new(Arc::new(store))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(create_app(state(dir.path()).await), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["/health"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_store_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await.with_model(Arc::new(DummyModel));
        state.store.record_publication("https://decrypt.co/a", "bitcoin rallies").await;

        let (status, body) = get(create_app(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["application"]["posted_articles_count"], 1);
        assert!(body["application"]["last_post_time"].is_string());
    }

    #[tokio::test]
    async fn test_unhealthy_model_gives_503() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_app(state(dir.path()).await.with_model(Arc::new(DownModel)));

        let (status, body) = get(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["dependencies"][0]["error"], "Inference error: connection refused");

        let (status, body) = get(app.clone(), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);

        let (status, body) = get(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dependencies"][0]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let dir = tempfile::tempdir().unwrap();
        let response = create_app(state(dir.path()).await)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
