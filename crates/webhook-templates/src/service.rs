//! The template service: list/search/download remote templates, and run
//! them as signed, placeholder-resolved HTTP requests.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use webhook_core::{
    drop_hop_by_hop, merge_headers, parse_absolute_http_url, validate_method_token, Cancelled,
    EnvLookup, HeaderPair, HeaderResolveContext, MethodError, PlaceholderError,
    PlaceholderResolver, UrlValidationError,
};
use webhook_replay::{DispatchError, DispatchResponse, Dispatcher};

use crate::cache::{IndexCache, IndexCacheError};
use crate::local::{LocalTemplateError, LocalTemplateStore};
use crate::remote::{RemoteTemplateClient, RemoteTemplateError};
use crate::types::{LocalTemplate, TemplateMetadata, TemplatesIndex};

/// How long a fetched index stays fresh before a listing forces a
/// remote re-fetch.
pub const INDEX_TTL: Duration = Duration::from_secs(60 * 60);

const ENV_GITHUB_SECRET: &str = "GITHUB_WEBHOOK_SECRET";
const ENV_GENERIC_SECRET: &str = "WEBHOOK_SECRET";

#[derive(Debug, Error)]
pub enum TemplateServiceError {
    #[error("template id must not be empty")]
    InvalidTemplateId,
    #[error("search query must not be empty")]
    InvalidTemplateQuery,
    #[error("no template matches id {0:?}")]
    TemplateNotFound(String),
    #[error("the remote templates index is unavailable and no cache exists")]
    TemplateIndexUnavailable,
    #[error("template run requires a webhook secret but none was provided")]
    RunSecretRequired,
    #[error("template has no url and none was provided to run")]
    RunTargetUrlRequired,
    #[error("run timeout must be greater than zero")]
    RunTimeoutInvalid,
    #[error(transparent)]
    InvalidUrl(#[from] UrlValidationError),
    #[error(transparent)]
    InvalidMethod(#[from] MethodError),
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
    #[error(transparent)]
    Remote(#[from] RemoteTemplateError),
    #[error(transparent)]
    Local(#[from] LocalTemplateError),
    #[error(transparent)]
    Cache(#[from] IndexCacheError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// A remote template entry, annotated with whether it has already been
/// downloaded locally.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemoteTemplateListing {
    #[serde(flatten)]
    pub metadata: TemplateMetadata,
    pub downloaded_locally: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DownloadAllOutcome {
    pub total: usize,
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub failed_ids: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResults {
    pub local: Vec<LocalTemplate>,
    pub remote: Vec<TemplateMetadata>,
}

/// Arguments for [`TemplateService::run`].
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub id: String,
    pub target_url: Option<String>,
    pub secret: Option<String>,
    pub allow_env_placeholders: bool,
    pub header_overrides: Vec<HeaderPair>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutcome {
    pub template_id: String,
    pub method: String,
    pub url: String,
    pub request_headers: Vec<HeaderPair>,
    pub response: DispatchResponse,
}

/// Lists, searches, downloads, and runs webhook templates.
pub struct TemplateService {
    remote: RemoteTemplateClient,
    local: LocalTemplateStore,
    cache: IndexCache,
    clock: Arc<dyn webhook_core::Clock>,
    env: Arc<dyn EnvLookup>,
    placeholders: PlaceholderResolver,
}

impl TemplateService {
    #[must_use]
    pub fn new(
        remote: RemoteTemplateClient,
        local: LocalTemplateStore,
        cache: IndexCache,
        clock: Arc<dyn webhook_core::Clock>,
        env: Arc<dyn EnvLookup>,
        placeholders: PlaceholderResolver,
    ) -> Self {
        Self {
            remote,
            local,
            cache,
            clock,
            env,
            placeholders,
        }
    }

    /// Loads the remote index, honouring the cache TTL unless
    /// `force_refresh` is set. Falls back to a stale cache entry when
    /// the remote fetch fails.
    async fn load_index(&self, force_refresh: bool) -> Result<TemplatesIndex, TemplateServiceError> {
        let cached = self.cache.get().await;
        if !force_refresh {
            if let Some(entry) = &cached {
                let age = self.clock.now().signed_duration_since(entry.cached_at);
                if age < chrono::Duration::from_std(INDEX_TTL).unwrap() {
                    return Ok(entry.index.clone());
                }
            }
        }

        match self.remote.fetch_index().await {
            Ok(index) => {
                self.cache.set(&index, self.clock.now()).await?;
                Ok(index)
            }
            Err(err) => {
                if let Some(entry) = cached {
                    tracing::warn!(error = %err, "remote index fetch failed, serving stale cache");
                    Ok(entry.index)
                } else {
                    Err(TemplateServiceError::TemplateIndexUnavailable)
                }
            }
        }
    }

    /// Lists remote templates, optionally filtered by provider, each
    /// annotated with whether it is already downloaded locally.
    pub async fn list_remote(
        &self,
        provider: Option<&str>,
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteTemplateListing>, TemplateServiceError> {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        let index = self.load_index(force_refresh).await?;
        let local_ids: std::collections::HashSet<String> = self
            .local
            .list(cancel)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        Ok(index
            .templates
            .into_iter()
            .filter(|t| {
                provider
                    .map(|p| t.provider.eq_ignore_ascii_case(p))
                    .unwrap_or(true)
            })
            .map(|metadata| {
                let downloaded_locally = local_ids.contains(&metadata.id);
                RemoteTemplateListing {
                    metadata,
                    downloaded_locally,
                }
            })
            .collect())
    }

    /// Downloads a single template by exact id.
    pub async fn download(
        &self,
        id: &str,
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<LocalTemplate, TemplateServiceError> {
        if id.trim().is_empty() {
            return Err(TemplateServiceError::InvalidTemplateId);
        }
        let index = self.load_index(force_refresh).await?;
        let metadata = index
            .templates
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TemplateServiceError::TemplateNotFound(id.to_string()))?;

        let mut template = self.remote.fetch_template(&metadata.file).await?;
        if template.provider.is_none() {
            template.provider = Some(metadata.provider.clone());
        }
        if template.event.is_none() {
            template.event = Some(metadata.event.clone());
        }
        if template.description.is_none() {
            template.description = metadata.description.clone();
        }

        Ok(self.local.save(&metadata, template, cancel).await?)
    }

    /// Downloads every template in the index not already present
    /// locally. No single failure aborts the batch.
    pub async fn download_all(
        &self,
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<DownloadAllOutcome, TemplateServiceError> {
        let index = self.load_index(force_refresh).await?;
        let local_ids: std::collections::HashSet<String> = self
            .local
            .list(cancel)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        let total = index.templates.len();
        let mut skipped = 0;
        let mut downloaded = 0;
        let mut failed_ids = Vec::new();

        for metadata in &index.templates {
            if cancel.is_cancelled() {
                return Err(Cancelled.into());
            }
            if local_ids.contains(&metadata.id) {
                skipped += 1;
                continue;
            }
            match self.download(&metadata.id, false, cancel).await {
                Ok(_) => downloaded += 1,
                Err(err) => {
                    tracing::warn!(id = %metadata.id, error = %err, "failed to download template");
                    failed_ids.push(metadata.id.clone());
                }
            }
        }

        Ok(DownloadAllOutcome {
            total,
            skipped,
            downloaded,
            failed: failed_ids.len(),
            failed_ids,
        })
    }

    /// Searches local and remote templates for a case-insensitive
    /// substring match against id/name/provider/event/description.
    pub async fn search(
        &self,
        query: &str,
        provider: Option<&str>,
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<SearchResults, TemplateServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TemplateServiceError::InvalidTemplateQuery);
        }
        let needle = query.to_lowercase();
        let index = self.load_index(force_refresh).await?;

        let matches_metadata = |m: &TemplateMetadata| {
            if let Some(p) = provider {
                if !m.provider.eq_ignore_ascii_case(p) {
                    return false;
                }
            }
            [&m.id, &m.name, &m.provider, &m.event]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
                || m.description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        };

        let remote = index
            .templates
            .into_iter()
            .filter(matches_metadata)
            .collect();

        let local = self
            .local
            .list(cancel)
            .await?
            .into_iter()
            .filter(|t| matches_metadata(&t.metadata))
            .collect();

        Ok(SearchResults { local, remote })
    }

    pub async fn list_local(
        &self,
        provider: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocalTemplate>, TemplateServiceError> {
        Ok(self
            .local
            .list(cancel)
            .await?
            .into_iter()
            .filter(|t| {
                provider
                    .map(|p| t.metadata.provider.eq_ignore_ascii_case(p))
                    .unwrap_or(true)
            })
            .collect())
    }

    pub async fn delete_local(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), TemplateServiceError> {
        if id.trim().is_empty() {
            return Err(TemplateServiceError::InvalidTemplateId);
        }
        Ok(self.local.delete(id, cancel).await?)
    }

    pub async fn clean_local(&self, cancel: &CancellationToken) -> Result<usize, TemplateServiceError> {
        Ok(self.local.clean(cancel).await?)
    }

    pub async fn clear_cache(&self) -> Result<(), TemplateServiceError> {
        Ok(self.cache.clear().await?)
    }

    /// Resolves and dispatches a signed, placeholder-interpolated
    /// request from a locally downloaded template.
    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, TemplateServiceError> {
        if request.id.trim().is_empty() {
            return Err(TemplateServiceError::InvalidTemplateId);
        }
        if request.timeout.is_zero() {
            return Err(TemplateServiceError::RunTimeoutInvalid);
        }

        let local = self
            .local
            .find(&request.id, cancel)
            .await?
            .ok_or_else(|| TemplateServiceError::TemplateNotFound(request.id.clone()))?;
        let template = &local.template;

        let raw_url = request
            .target_url
            .clone()
            .or_else(|| template.url.clone())
            .ok_or(TemplateServiceError::RunTargetUrlRequired)?;
        let url = parse_absolute_http_url(&raw_url)?;
        let method = validate_method_token(&template.method)?;

        let resolver = self
            .placeholders
            .with_env_placeholders_allowed(request.allow_env_placeholders);
        let body = resolver.resolve_json(&template.body)?;

        let merged_headers = merge_headers(&template.headers, &request.header_overrides);
        let provider = template
            .provider
            .clone()
            .unwrap_or_else(|| local.metadata.provider.clone());
        let secret = request
            .secret
            .clone()
            .or_else(|| {
                if provider.eq_ignore_ascii_case("github") {
                    self.env.get(ENV_GITHUB_SECRET)
                } else {
                    None
                }
            })
            .or_else(|| self.env.get(ENV_GENERIC_SECRET))
            .unwrap_or_default();

        let ctx = HeaderResolveContext {
            provider: provider.clone(),
            body: body.clone(),
            secret,
        };

        let mut outgoing = Vec::with_capacity(merged_headers.len());
        for header in drop_hop_by_hop(&merged_headers) {
            let value = resolver
                .resolve_header_value(&header.key, &header.value, &ctx)
                .map_err(|err| match err {
                    PlaceholderError::MissingSecret => TemplateServiceError::RunSecretRequired,
                    other => TemplateServiceError::Placeholder(other),
                })?;
            outgoing.push(HeaderPair::new(header.key, value));
        }

        tracing::info!(template_id = %request.id, %method, url = %url, "running template");

        let dispatcher = Dispatcher::new(request.timeout, 5 * 1024 * 1024)?;
        let response = dispatcher
            .send(&method, url.as_str(), &outgoing, body)
            .await?;

        Ok(RunOutcome {
            template_id: request.id.clone(),
            method,
            url: url.to_string(),
            request_headers: outgoing,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use webhook_core::{FixedClock, HeaderPair, MapEnv, SequenceIdGenerator};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::local::LocalTemplateStore;
    use crate::types::WebhookTemplate;

    const INDEX_BODY: &str = r#"{ "version": "1", "templates": [
        { "id": "github-push", "name": "GitHub push", "provider": "github", "event": "push", "file": "github/github-push.jsonc" }
    ] }"#;

    async fn mock_index_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/templates/templates.jsonc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(INDEX_BODY))
            .mount(&server)
            .await;
        server
    }

    fn service_with(
        server: &MockServer,
        templates_dir: &std::path::Path,
        clock: Arc<dyn webhook_core::Clock>,
        env: Arc<dyn EnvLookup>,
    ) -> TemplateService {
        let remote = RemoteTemplateClient::new(reqwest::Client::new(), server.uri());
        let local = LocalTemplateStore::new(templates_dir);
        let cache = IndexCache::new(templates_dir);
        let placeholders = PlaceholderResolver::new(
            clock.clone(),
            Arc::new(SequenceIdGenerator::single("fixed-id")),
            env.clone(),
        );
        TemplateService::new(remote, local, cache, clock, env, placeholders)
    }

    #[tokio::test]
    async fn list_remote_uses_cache_within_ttl() {
        let server = mock_index_server().await;
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let service = service_with(&server, dir.path(), clock.clone(), env.clone());
        let first = service.list_remote(None, false, &cancel).await.unwrap();
        assert_eq!(first.len(), 1);

        server.reset().await;
        let second = service.list_remote(None, false, &cancel).await.unwrap();
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn list_remote_refreshes_past_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let stale_at = Utc::now() - chrono::Duration::hours(2);
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let cache = IndexCache::new(dir.path());
        cache
            .set(
                &TemplatesIndex {
                    version: "1".to_string(),
                    templates: vec![],
                },
                stale_at,
            )
            .await
            .unwrap();

        let server = mock_index_server().await;
        let service = service_with(&server, dir.path(), clock, env);
        let refreshed = service.list_remote(None, false, &cancel).await.unwrap();
        assert_eq!(refreshed.len(), 1);
    }

    #[tokio::test]
    async fn stale_cache_is_served_when_remote_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let stale_at = Utc::now() - chrono::Duration::hours(2);
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let cache = IndexCache::new(dir.path());
        cache
            .set(
                &TemplatesIndex {
                    version: "1".to_string(),
                    templates: vec![TemplateMetadata {
                        id: "stale-template".to_string(),
                        name: "Stale".to_string(),
                        provider: "github".to_string(),
                        event: "push".to_string(),
                        file: "github/stale.jsonc".to_string(),
                        description: None,
                    }],
                },
                stale_at,
            )
            .await
            .unwrap();

        // Server with no mounted mocks: any request gets a 404.
        let server = MockServer::start().await;
        let service = service_with(&server, dir.path(), clock, env);
        let listings = service.list_remote(None, false, &cancel).await.unwrap();
        assert_eq!(listings[0].metadata.id, "stale-template");
    }

    #[tokio::test]
    async fn download_fetches_and_saves_locally() {
        let server = mock_index_server().await;
        Mock::given(method("GET"))
            .and(path("/templates/github/github-push.jsonc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{ "method": "POST", "url": "https://example.com/hook", "headers": [], "body": {"ok": true} }"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let service = service_with(&server, dir.path(), clock, env);
        let local = service.download("github-push", false, &cancel).await.unwrap();
        assert_eq!(local.id, "github-push");

        let locals = service.list_local(None, &cancel).await.unwrap();
        assert_eq!(locals.len(), 1);
    }

    #[tokio::test]
    async fn download_all_skips_already_downloaded() {
        let server = mock_index_server().await;
        Mock::given(method("GET"))
            .and(path("/templates/github/github-push.jsonc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{ "method": "POST", "url": "https://example.com/hook", "headers": [], "body": {"ok": true} }"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let service = service_with(&server, dir.path(), clock, env);
        let first = service.download_all(false, &cancel).await.unwrap();
        assert_eq!(first.downloaded, 1);
        assert_eq!(first.skipped, 0);

        let second = service.download_all(false, &cancel).await.unwrap();
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn search_matches_remote_by_substring() {
        let server = mock_index_server().await;
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let service = service_with(&server, dir.path(), clock, env);
        let results = service.search("push", None, false, &cancel).await.unwrap();
        assert_eq!(results.remote.len(), 1);
        assert_eq!(results.remote[0].id, "github-push");

        let empty = service
            .search("nonexistent", None, false, &cancel)
            .await
            .unwrap();
        assert!(empty.remote.is_empty());
    }

    #[tokio::test]
    async fn search_rejects_empty_query() {
        let server = mock_index_server().await;
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let service = service_with(&server, dir.path(), clock, env);
        let err = service.search("  ", None, false, &cancel).await.unwrap_err();
        assert!(matches!(err, TemplateServiceError::InvalidTemplateQuery));
    }

    async fn saved_github_template(
        local: &LocalTemplateStore,
        cancel: &CancellationToken,
    ) -> TemplateMetadata {
        let metadata = TemplateMetadata {
            id: "github-push".to_string(),
            name: "GitHub push".to_string(),
            provider: "github".to_string(),
            event: "push".to_string(),
            file: "github/github-push.jsonc".to_string(),
            description: None,
        };
        let template = WebhookTemplate {
            method: "POST".to_string(),
            url: None,
            provider: Some("github".to_string()),
            event: Some("push".to_string()),
            description: None,
            headers: vec![HeaderPair::new(
                "X-Hub-Signature-256",
                "$github:x-hub-signature-256".to_string(),
            )],
            body: serde_json::json!({"ref": "refs/heads/main"}),
            metadata: None,
        };
        local.save(&metadata, template, cancel).await.unwrap();
        metadata
    }

    #[tokio::test]
    async fn run_signs_with_provider_specific_secret_from_environment() {
        let remote_server = mock_index_server().await;
        let target_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&target_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> =
            Arc::new(MapEnv::new().with("GITHUB_WEBHOOK_SECRET", "s3cr3t"));
        let cancel = CancellationToken::new();

        let local = LocalTemplateStore::new(dir.path());
        saved_github_template(&local, &cancel).await;

        let service = service_with(&remote_server, dir.path(), clock, env);
        let request = RunRequest {
            id: "github-push".to_string(),
            target_url: Some(format!("{}/hook", target_server.uri())),
            secret: None,
            allow_env_placeholders: false,
            header_overrides: Vec::new(),
            timeout: Duration::from_secs(5),
        };

        let outcome = service.run(&request, &cancel).await.unwrap();
        assert_eq!(outcome.response.status, 200);
        let signature = outcome
            .request_headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case("X-Hub-Signature-256"))
            .unwrap();
        assert!(signature.value.starts_with("sha256="));
    }

    #[tokio::test]
    async fn run_rejects_env_placeholders_unless_opted_in() {
        let remote_server = mock_index_server().await;
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new().with("SOME_VAR", "value"));
        let cancel = CancellationToken::new();

        let local = LocalTemplateStore::new(dir.path());
        let metadata = TemplateMetadata {
            id: "env-template".to_string(),
            name: "Env template".to_string(),
            provider: "generic".to_string(),
            event: "ping".to_string(),
            file: "generic/env.jsonc".to_string(),
            description: None,
        };
        let template = WebhookTemplate {
            method: "POST".to_string(),
            url: Some("https://example.com/hook".to_string()),
            provider: Some("generic".to_string()),
            event: Some("ping".to_string()),
            description: None,
            headers: Vec::new(),
            body: serde_json::json!({"value": "$env:SOME_VAR"}),
            metadata: None,
        };
        local.save(&metadata, template, &cancel).await.unwrap();

        let service = service_with(&remote_server, dir.path(), clock, env);
        let request = RunRequest {
            id: "env-template".to_string(),
            target_url: None,
            secret: None,
            allow_env_placeholders: false,
            header_overrides: Vec::new(),
            timeout: Duration::from_secs(5),
        };
        let err = service.run(&request, &cancel).await.unwrap_err();
        assert!(matches!(
            err,
            TemplateServiceError::Placeholder(PlaceholderError::EnvironmentPlaceholdersDisabled)
        ));
    }

    #[tokio::test]
    async fn run_requires_target_url_when_template_has_none() {
        let remote_server = mock_index_server().await;
        let dir = tempfile::tempdir().unwrap();
        let clock: Arc<dyn webhook_core::Clock> = Arc::new(FixedClock(Utc::now()));
        let env: Arc<dyn EnvLookup> = Arc::new(MapEnv::new());
        let cancel = CancellationToken::new();

        let local = LocalTemplateStore::new(dir.path());
        saved_github_template(&local, &cancel).await;

        let service = service_with(&remote_server, dir.path(), clock, env);
        let request = RunRequest {
            id: "github-push".to_string(),
            target_url: None,
            secret: None,
            allow_env_placeholders: false,
            header_overrides: Vec::new(),
            timeout: Duration::from_secs(5),
        };
        let err = service.run(&request, &cancel).await.unwrap_err();
        assert!(matches!(err, TemplateServiceError::RunTargetUrlRequired));
    }
}
