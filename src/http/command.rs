//! Command server: runtime control over a separate listener.
//!
//! # Endpoints
//! - `/devel`: enable development mode
//! - `/prod`: disable development mode and reload
//! - `/reload`: reload the content root
//! - `/status`, `/status.json`: describe the current generation

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::registry::SiteRegistry;

const OK: &str = "OK\n";

/// Build the command router.
#[allow(deprecated)]
pub fn command_router(registry: Arc<SiteRegistry>, timeout: Duration) -> Router {
    Router::new()
        .route("/devel", get(devel))
        .route("/prod", get(prod))
        .route("/reload", get(reload))
        .route("/status", get(status))
        .route("/status.json", get(status_json))
        .fallback(unknown)
        .with_state(registry)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

async fn devel(State(registry): State<Arc<SiteRegistry>>) -> &'static str {
    tracing::info!("Enabling development mode");
    registry.set_development_mode(true);
    OK
}

async fn prod(State(registry): State<Arc<SiteRegistry>>) -> Response {
    tracing::info!("Enabling production mode");
    registry.set_development_mode(false);
    do_reload(&registry).await
}

async fn reload(State(registry): State<Arc<SiteRegistry>>) -> Response {
    do_reload(&registry).await
}

async fn do_reload(registry: &Arc<SiteRegistry>) -> Response {
    match registry.reload().await {
        Ok(()) => OK.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Reload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("reload failed: {}\n", e),
            )
                .into_response()
        }
    }
}

async fn status(State(registry): State<Arc<SiteRegistry>>) -> String {
    registry.status().to_string()
}

async fn status_json(State(registry): State<Arc<SiteRegistry>>) -> impl IntoResponse {
    Json(registry.status())
}

async fn unknown() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Unknown command\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn devel_toggles_mode() {
        let registry = Arc::new(SiteRegistry::new("/nonexistent", ""));
        let router = command_router(registry.clone(), Duration::from_secs(5));

        let (status, body) = call(router, "/devel").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK\n");
        assert!(registry.development_mode());
    }

    #[tokio::test]
    async fn failed_reload_reports_error() {
        let registry = Arc::new(SiteRegistry::new("/nonexistent", ""));
        registry.set_development_mode(true);
        let router = command_router(registry.clone(), Duration::from_secs(5));

        let (status, body) = call(router, "/prod").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("reload failed: "));
        assert!(!registry.development_mode());
    }

    #[tokio::test]
    async fn unknown_command() {
        let registry = Arc::new(SiteRegistry::new("/nonexistent", ""));
        let router = command_router(registry, Duration::from_secs(5));

        let (status, body) = call(router, "/restart").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Unknown command\n");
    }
}
