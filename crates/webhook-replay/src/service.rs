//! The replay service: re-sends a stored capture against a live target,
//! with optional method, path, header, and body overrides.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use webhook_capture::{CaptureStore, CaptureStoreError};
use webhook_core::{
    drop_hop_by_hop, merge_headers, parse_absolute_http_url, resolve_relative,
    validate_method_token, Cancelled, HeaderPair, MethodError, UrlValidationError,
};

use crate::dispatch::{DispatchError, DispatchResponse, Dispatcher};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("invalid target URL: {0}")]
    InvalidTargetUrl(#[source] UrlValidationError),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[source] UrlValidationError),
    #[error("either a target URL or a --base-url must be supplied")]
    NoTargetSupplied,
    #[error("invalid method override: {0}")]
    InvalidMethod(#[from] MethodError),
    #[error("captured body is not valid base64: {0}")]
    InvalidBody(#[from] base64::DecodeError),
    #[error(transparent)]
    Store(#[from] CaptureStoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Overrides a caller may apply when replaying a capture.
#[derive(Debug, Clone, Default)]
pub struct ReplayOverrides {
    pub method: Option<String>,
    pub headers: Vec<HeaderPair>,
    pub body: Option<Vec<u8>>,
}

/// A replay request: which capture to resend, and where.
///
/// Exactly one of `target_url`/`base_url` determines the destination.
/// `target_url` is an absolute URL used verbatim; `base_url` is an
/// absolute URL that the captured URL/path is resolved against, so the
/// captured query string and path survive the replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayRequest {
    pub selector: String,
    pub target_url: Option<String>,
    pub base_url: Option<String>,
    pub overrides: ReplayOverrides,
}

/// What was actually sent, and what came back.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReplayOutcome {
    pub capture_id: String,
    pub method: String,
    pub url: String,
    pub request_headers: Vec<HeaderPair>,
    pub response: DispatchResponse,
}

/// Replays stored captures against a target base URL.
pub struct ReplayService {
    store: Arc<CaptureStore>,
    dispatcher: Dispatcher,
}

impl ReplayService {
    #[must_use]
    pub fn new(store: Arc<CaptureStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Resolves the request's selector to a capture, then re-sends it
    /// against the request's target, applying method/header/body
    /// overrides on top of the captured request.
    pub async fn replay(
        &self,
        request: &ReplayRequest,
        cancel: &CancellationToken,
    ) -> Result<ReplayOutcome, ReplayError> {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }

        let target_url = request
            .target_url
            .as_deref()
            .filter(|s| !s.is_empty());
        let base_url = request.base_url.as_deref().filter(|s| !s.is_empty());
        if target_url.is_none() && base_url.is_none() {
            return Err(ReplayError::NoTargetSupplied);
        }

        let capture = self
            .store
            .resolve_by_id_or_prefix(&request.selector, cancel)
            .await?;
        let record = &capture.record;

        let url = if let Some(target) = target_url {
            parse_absolute_http_url(target).map_err(ReplayError::InvalidTargetUrl)?
        } else {
            let base = parse_absolute_http_url(base_url.unwrap())
                .map_err(ReplayError::InvalidBaseUrl)?;
            let path = if !record.url.is_empty() {
                record.url.as_str()
            } else if !record.path.is_empty() {
                record.path.as_str()
            } else {
                "/"
            };
            resolve_relative(&base, path).map_err(ReplayError::InvalidBaseUrl)?
        };

        let overrides = &request.overrides;
        let method = match &overrides.method {
            Some(m) => validate_method_token(m)?,
            None => validate_method_token(&record.method)?,
        };

        let forwarded = drop_hop_by_hop(&record.headers);
        let headers = merge_headers(&forwarded, &overrides.headers);

        let body = match &overrides.body {
            Some(b) => b.clone(),
            None => record.decode_body()?,
        };

        tracing::info!(
            capture_id = %record.id,
            %method,
            url = %url,
            "replaying capture"
        );

        let response = self
            .dispatcher
            .send(&method, url.as_str(), &headers, body)
            .await?;

        Ok(ReplayOutcome {
            capture_id: record.id.clone(),
            method,
            url: url.to_string(),
            request_headers: headers,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use webhook_core::{FixedClock, SequenceIdGenerator};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn seeded_store(root: &std::path::Path) -> (Arc<CaptureStore>, String) {
        let clock = Arc::new(FixedClock(chrono::Utc::now()));
        let ids = Arc::new(SequenceIdGenerator::single(
            "cccccccc-dddd-eeee-ffff-000000000000",
        ));
        let store = Arc::new(CaptureStore::new(root, clock, ids, "better-webhook/test"));
        let cancel = CancellationToken::new();
        let mut record = store.build_base_record();
        record.method = "POST".to_string();
        record.path = "/webhooks/github".to_string();
        record.headers = vec![HeaderPair::new("X-GitHub-Event", "push")];
        record.raw_body_base64 =
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b"{\"ok\":true}");
        store.save(&record, &cancel).await.unwrap();
        (store, record.id)
    }

    #[tokio::test]
    async fn replays_captured_request_against_base_url_preserving_path() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path()).await;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/github"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(Duration::from_secs(5), 1024).unwrap();
        let service = ReplayService::new(store, dispatcher);
        let request = ReplayRequest {
            selector: id,
            base_url: Some(server.uri()),
            ..Default::default()
        };
        let outcome = service
            .replay(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.response.status, 200);
        assert_eq!(outcome.method, "POST");
    }

    #[tokio::test]
    async fn target_url_override_ignores_captured_path() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path()).await;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/different"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(Duration::from_secs(5), 1024).unwrap();
        let service = ReplayService::new(store, dispatcher);
        let request = ReplayRequest {
            selector: id,
            target_url: Some(format!("{}/different", server.uri())),
            ..Default::default()
        };
        let outcome = service
            .replay(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.response.status, 204);
    }

    #[tokio::test]
    async fn no_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path()).await;
        let dispatcher = Dispatcher::new(Duration::from_secs(5), 1024).unwrap();
        let service = ReplayService::new(store, dispatcher);
        let request = ReplayRequest {
            selector: id,
            ..Default::default()
        };
        let err = service
            .replay(&request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::NoTargetSupplied));
    }
}
