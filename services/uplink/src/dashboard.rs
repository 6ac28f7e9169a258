//! Status dashboard: banner page and JSON API
//!
//! Pure presenter over the connectivity store. The banner page renders
//! nothing alarming while online or during the initial check; while
//! offline it shows a persistent banner with the retry count, the time
//! since the last probe and a retry button.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::{current_epoch_ms, StoreHandle};
use crate::supervisor::Supervisor;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub store: StoreHandle,
    pub supervisor: Arc<Supervisor>,
}

/// Build the dashboard axum router
pub fn build_router(store: StoreHandle, supervisor: Arc<Supervisor>) -> Router {
    let dashboard_state = DashboardState { store, supervisor };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/retry", post(retry_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

/// Human-readable time since the last probe
fn elapsed_display(last_checked_epoch_ms: u64, now_ms: u64) -> String {
    if last_checked_epoch_ms == 0 {
        return "never".to_string();
    }
    let elapsed_secs = now_ms.saturating_sub(last_checked_epoch_ms) / 1000;
    format!(
        "{} ago",
        humantime::format_duration(Duration::from_secs(elapsed_secs))
    )
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.store.snapshot();

    let banner = if state.initial_check {
        r#"<div style="padding: 0.75rem 1rem; border-radius: 0.25rem; color: #383d41; background-color: #e2e3e5;">
            Checking server status&hellip;
        </div>"#
            .to_string()
    } else if state.server_online {
        r#"<div style="padding: 0.75rem 1rem; border-radius: 0.25rem; color: #155724; background-color: #d4edda;">
            AgroSmart server is online
        </div>"#
            .to_string()
    } else {
        format!(
            r#"<div style="padding: 0.75rem 1rem; border-radius: 0.25rem; color: #721c24; background-color: #f8d7da;">
                <strong>AgroSmart server is offline.</strong>
                Retries: {retry_count}. Last checked: {elapsed}.
                Check that the backend service is running and reachable, then retry.
                <button onclick="fetch('/api/retry', {{method: 'POST'}}).then(() => location.reload())"
                        style="margin-left: 1rem;">Retry</button>
            </div>"#,
            retry_count = state.retry_count,
            elapsed = elapsed_display(state.last_checked_epoch_ms, current_epoch_ms()),
        )
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>AgroSmart Uplink</title>
    <script>setInterval(() => location.reload(), 5000);</script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 720px; margin: 0 auto; padding: 1rem;">
    <h1>AgroSmart Uplink</h1>
    {banner}
</body>
</html>"#,
        banner = banner,
    );

    Html(html)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    axum::Json(dashboard.store.snapshot())
}

async fn retry_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    tracing::debug!("Manual retry requested");
    dashboard.supervisor.retry_connection().await;
    StatusCode::NO_CONTENT
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::config::BackendConfig;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::state::new_store_handle;

    fn setup(mock: MockHttpClient) -> (StoreHandle, Router) {
        let store = new_store_handle();
        let supervisor = Arc::new(Supervisor::new(
            Arc::clone(&store),
            Arc::new(mock),
            &BackendConfig::default(),
            CancellationToken::new(),
        ));
        let router = build_router(Arc::clone(&store), supervisor);
        (store, router)
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (_store, app) = setup(MockHttpClient::new());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_returns_connectivity_json() {
        let (store, app) = setup(MockHttpClient::new());
        let seq = store.issue_probe();
        store.apply_failure(seq, 1000);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["server_online"], false);
        assert_eq!(json["initial_check"], false);
        assert_eq!(json["retry_count"], 1);
        assert_eq!(json["last_checked_epoch_ms"], 1000);
    }

    #[tokio::test]
    async fn index_shows_checking_banner_before_first_probe() {
        let (_store, app) = setup(MockHttpClient::new());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("AgroSmart Uplink"));
        assert!(html.contains("Checking server status"));
    }

    #[tokio::test]
    async fn index_shows_offline_banner_with_retry_button() {
        let (store, app) = setup(MockHttpClient::new());
        let seq = store.issue_probe();
        store.apply_failure(seq, 1000);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("AgroSmart server is offline"));
        assert!(html.contains("Retries: 1"));
        assert!(html.contains("Retry</button>"));
    }

    #[tokio::test]
    async fn index_shows_online_banner() {
        let (store, app) = setup(MockHttpClient::new());
        let seq = store.issue_probe();
        store.apply_success(seq, 1000);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("AgroSmart server is online"));
    }

    #[tokio::test]
    async fn retry_endpoint_triggers_a_probe() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().times(1).returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: String::new(),
                })
            })
        });

        let (store, app) = setup(mock);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/retry")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.snapshot().server_online);
    }

    #[test]
    fn elapsed_display_handles_never_and_durations() {
        assert_eq!(elapsed_display(0, 10_000), "never");
        assert_eq!(elapsed_display(10_000, 25_000), "15s ago");
        assert_eq!(elapsed_display(25_000, 10_000), "0s ago");
    }
}
