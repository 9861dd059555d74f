//! Fetches the remote templates index and individual template files
//! over HTTP, with strict file-path and response-size safety.

use thiserror::Error;
use webhook_core::JsoncError;

use crate::types::{TemplatesIndex, WebhookTemplate};

/// Response bodies larger than this are rejected outright.
pub const MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RemoteTemplateError {
    #[error("unsafe template file path: {0:?}")]
    UnsafeFilePath(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    NonSuccessStatus(u16),
    #[error("response exceeded the {MAX_RESPONSE_BYTES}-byte cap")]
    ResponseTooLarge,
    #[error("invalid JSONC: {0}")]
    Jsonc(#[from] JsoncError),
    #[error("templates index is invalid: {0}")]
    InvalidIndex(&'static str),
}

/// Validates a template's `file` path against the remote-client safety
/// rules: relative, `/`-separated segments of `[A-Za-z0-9._-]`, no `..`,
/// no `?`/`#`/`%`/`\`/control characters, and a mandatory `.jsonc` suffix.
pub fn validate_safe_file_path(path: &str) -> Result<(), RemoteTemplateError> {
    let reject = || Err(RemoteTemplateError::UnsafeFilePath(path.to_string()));
    if path.is_empty() || !path.ends_with(".jsonc") {
        return reject();
    }
    if path.contains("..") || path.starts_with('/') || path.contains("//") {
        return reject();
    }
    if path.chars().any(|c| {
        c.is_control() || matches!(c, '?' | '#' | '%' | '\\')
    }) {
        return reject();
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return reject();
        }
        let ok = segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !ok {
            return reject();
        }
    }
    Ok(())
}

/// Fetches JSONC documents from a fixed base URL (default
/// `https://raw.githubusercontent.com/endalk200/better-webhook/main`).
pub struct RemoteTemplateClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteTemplateClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetches and validates `<base>/templates/templates.jsonc`.
    pub async fn fetch_index(&self) -> Result<TemplatesIndex, RemoteTemplateError> {
        let url = format!("{}/templates/templates.jsonc", self.base_url.trim_end_matches('/'));
        let text = self.fetch_text(&url).await?;
        let index: TemplatesIndex = webhook_core::parse_jsonc(&text)?;
        index
            .validate()
            .map_err(RemoteTemplateError::InvalidIndex)?;
        Ok(index)
    }

    /// Fetches and validates `<base>/templates/<file>`.
    pub async fn fetch_template(&self, file: &str) -> Result<WebhookTemplate, RemoteTemplateError> {
        validate_safe_file_path(file)?;
        let url = format!("{}/templates/{file}", self.base_url.trim_end_matches('/'));
        let text = self.fetch_text(&url).await?;
        Ok(webhook_core::parse_jsonc(&text)?)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, RemoteTemplateError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteTemplateError::NonSuccessStatus(
                response.status().as_u16(),
            ));
        }

        let mut body = Vec::new();
        let mut stream = response;
        while let Some(chunk) = stream.chunk().await? {
            if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
                return Err(RemoteTemplateError::ResponseTooLarge);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn accepts_plain_and_nested_safe_paths() {
        assert!(validate_safe_file_path("github-push.jsonc").is_ok());
        assert!(validate_safe_file_path("github/github-push.jsonc").is_ok());
    }

    #[test]
    fn rejects_traversal_and_control_characters() {
        assert!(validate_safe_file_path("../escape.jsonc").is_err());
        assert!(validate_safe_file_path("github/../escape.jsonc").is_err());
        assert!(validate_safe_file_path("gi%20thub.jsonc").is_err());
        assert!(validate_safe_file_path("github/push.jsonc?x=1").is_err());
        assert!(validate_safe_file_path("push.txt").is_err());
        assert!(validate_safe_file_path("/absolute.jsonc").is_err());
        assert!(validate_safe_file_path("a//b.jsonc").is_err());
    }

    #[tokio::test]
    async fn fetches_and_validates_a_remote_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/templates/templates.jsonc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{ "version": "1", "templates": [
                    { "id": "github-push", "name": "GitHub push", "provider": "github", "event": "push", "file": "github/github-push.jsonc" }
                ] }"#,
            ))
            .mount(&server)
            .await;

        let client = RemoteTemplateClient::new(reqwest::Client::new(), server.uri());
        let index = client.fetch_index().await.unwrap();
        assert_eq!(index.templates.len(), 1);
    }

    #[tokio::test]
    async fn oversized_response_is_rejected() {
        let server = MockServer::start().await;
        let oversized = "a".repeat(MAX_RESPONSE_BYTES + 1);
        Mock::given(method("GET"))
            .and(path("/templates/templates.jsonc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(oversized))
            .mount(&server)
            .await;

        let client = RemoteTemplateClient::new(reqwest::Client::new(), server.uri());
        let err = client.fetch_index().await.unwrap_err();
        assert!(matches!(err, RemoteTemplateError::ResponseTooLarge));
    }

    #[tokio::test]
    async fn empty_index_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/templates/templates.jsonc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{ "version": "1", "templates": [] }"#),
            )
            .mount(&server)
            .await;

        let client = RemoteTemplateClient::new(reqwest::Client::new(), server.uri());
        let err = client.fetch_index().await.unwrap_err();
        assert!(matches!(err, RemoteTemplateError::InvalidIndex(_)));
    }
}
