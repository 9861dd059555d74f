//! The localhost capture server: accepts any method on any path, stores
//! the request verbatim, and always answers with an empty `204`
//! regardless of what the request contained — the point is to never
//! fail a sender's retry policy.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use base64::Engine as _;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use webhook_core::HeaderPair;

use crate::detect::{DetectionContext, DetectorRegistry};
use crate::store::CaptureStore;

/// Shared state for every capture request handler.
pub struct CaptureServerState {
    pub store: Arc<CaptureStore>,
    pub detectors: Arc<DetectorRegistry>,
    pub cancel: CancellationToken,
}

/// Builds the capture router: every method and path falls through to
/// [`capture_handler`], bounded by `max_body_bytes`.
pub fn build_router(state: Arc<CaptureServerState>, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(capture_handler)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until `state.cancel` fires.
pub async fn run_server(
    state: Arc<CaptureServerState>,
    addr: SocketAddr,
    max_body_bytes: usize,
) -> std::io::Result<()> {
    let cancel = state.cancel.clone();
    let app = build_router(state, max_body_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "capture server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

async fn capture_handler(
    State(state): State<Arc<CaptureServerState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header_pairs: Vec<HeaderPair> = headers
        .iter()
        .map(|(name, value)| {
            HeaderPair::new(name.as_str(), value.to_str().unwrap_or_default())
        })
        .collect();

    let mut record = state.store.build_base_record();
    record.method = method.to_string();
    record.path = uri.path().to_string();
    // `url` is the request-target (path + query), matching what every
    // HTTP/1.1 request line actually carries — never scheme/host.
    record.url = uri.to_string();
    record.content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    record.content_length = Some(body.len() as u64);
    record.raw_body_base64 = base64::engine::general_purpose::STANDARD.encode(&body);
    record.headers = header_pairs.clone();

    let detection_ctx = DetectionContext {
        method: method.as_str(),
        path: uri.path(),
        headers: &header_pairs,
        body: &body,
    };
    record.provider = state.detectors.identify(&detection_ctx);

    match state.store.save(&record, &state.cancel).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to persist capture");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use webhook_core::{FixedClock, SequenceIdGenerator};

    fn state(root: &std::path::Path) -> Arc<CaptureServerState> {
        let clock = Arc::new(FixedClock(chrono::Utc::now()));
        let ids = Arc::new(SequenceIdGenerator::single(
            "aaaaaaaa-bbbb-cccc-dddd-000000000000",
        ));
        let store = Arc::new(CaptureStore::new(
            root,
            clock,
            ids,
            "better-webhook/test",
        ));
        Arc::new(CaptureServerState {
            store,
            detectors: Arc::new(DetectorRegistry::with_defaults()),
            cancel: CancellationToken::new(),
        })
    }

    #[tokio::test]
    async fn stores_a_capture_and_responds_no_content() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state(dir.path()), 1024 * 1024);

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("content-type", "application/json")
            .header("x-github-event", "push")
            .body(axum::body::Body::from(r#"{"ok":true}"#))
            .unwrap();

        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let saved = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(saved, 1);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state(dir.path()), 8);

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .body(axum::body::Body::from("this body is far too long"))
            .unwrap();

        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
