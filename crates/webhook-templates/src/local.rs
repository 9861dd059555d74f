//! The on-disk local template store: one JSONC file per downloaded
//! template, nested under its provider directory.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use webhook_core::{safe_join_relative, Cancelled, JsoncError, PathSafetyError};

use crate::types::{LocalTemplate, TemplateMetadata, WebhookTemplate};

#[derive(Debug, Error)]
pub enum LocalTemplateError {
    #[error("failed to {verb} local template store: {source}")]
    Io {
        verb: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialise template: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    UnsafePath(#[from] PathSafetyError),
    #[error("template id must not be empty")]
    EmptyId,
    #[error("no local template matches id {0:?}")]
    NotFound(String),
    #[error("refusing to delete {0:?}: not a managed template file")]
    NotManaged(String),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Persists downloaded templates under `<root>/<provider>/<id>.jsonc`.
pub struct LocalTemplateStore {
    root: PathBuf,
}

impl LocalTemplateStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves `template` under its provider directory, embedding
    /// `metadata` as `_metadata` so the file is recognisable as managed.
    pub async fn save(
        &self,
        metadata: &TemplateMetadata,
        mut template: WebhookTemplate,
        cancel: &CancellationToken,
    ) -> Result<LocalTemplate, LocalTemplateError> {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        let relative = format!("{}/{}.jsonc", metadata.provider, metadata.id);
        let final_path = safe_join_relative(&self.root, &relative)?;
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LocalTemplateError::Io { verb: "create", source })?;
        }

        template.metadata = Some(metadata.clone());
        let downloaded_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let body = webhook_core::to_pretty_string(&template)?;

        let tmp_path = final_path.with_extension("jsonc.tmp");
        tokio::fs::write(&tmp_path, body.as_bytes())
            .await
            .map_err(|source| LocalTemplateError::Io { verb: "write", source })?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|source| LocalTemplateError::Io { verb: "rename", source })?;

        Ok(LocalTemplate {
            id: metadata.id.clone(),
            metadata: metadata.clone(),
            template,
            downloaded_at,
            file_path: final_path,
        })
    }

    /// Walks the store and returns every parseable local template.
    /// Files that fail to parse are skipped.
    pub async fn list(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocalTemplate>, LocalTemplateError> {
        let mut out = Vec::new();
        let mut provider_dirs = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(source) => return Err(LocalTemplateError::Io { verb: "read", source }),
        };

        while let Some(provider_entry) = provider_dirs
            .next_entry()
            .await
            .map_err(|source| LocalTemplateError::Io { verb: "read", source })?
        {
            if cancel.is_cancelled() {
                return Err(Cancelled.into());
            }
            let provider_path = provider_entry.path();
            if !provider_path.is_dir() {
                continue;
            }
            let mut files = tokio::fs::read_dir(&provider_path)
                .await
                .map_err(|source| LocalTemplateError::Io { verb: "read", source })?;
            while let Some(file_entry) = files
                .next_entry()
                .await
                .map_err(|source| LocalTemplateError::Io { verb: "read", source })?
            {
                let path = file_entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("jsonc") {
                    continue;
                }
                match self.read_template(&path).await {
                    Ok(local) => out.push(local),
                    Err(err) => {
                        tracing::warn!(file = %path.display(), error = %err, "skipping unreadable template file");
                    }
                }
            }
        }
        Ok(out)
    }

    /// Returns the local template with the given id, if any.
    pub async fn find(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<LocalTemplate>, LocalTemplateError> {
        Ok(self
            .list(cancel)
            .await?
            .into_iter()
            .find(|t| t.id == id))
    }

    /// Deletes the local template with the given id. Refuses to remove
    /// files that lack the managed `_metadata` marker.
    pub async fn delete(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), LocalTemplateError> {
        if id.trim().is_empty() {
            return Err(LocalTemplateError::EmptyId);
        }
        let found = self
            .find(id, cancel)
            .await?
            .ok_or_else(|| LocalTemplateError::NotFound(id.to_string()))?;

        let resolved = tokio::fs::canonicalize(&found.file_path)
            .await
            .unwrap_or_else(|_| found.file_path.clone());
        let root_resolved = tokio::fs::canonicalize(&self.root)
            .await
            .unwrap_or_else(|_| self.root.clone());
        if !resolved.starts_with(&root_resolved) {
            return Err(LocalTemplateError::NotManaged(
                found.file_path.display().to_string(),
            ));
        }

        tokio::fs::remove_file(&resolved)
            .await
            .map_err(|source| LocalTemplateError::Io { verb: "delete", source })
    }

    /// Removes every managed template file under the store root.
    pub async fn clean(&self, cancel: &CancellationToken) -> Result<usize, LocalTemplateError> {
        let templates = self.list(cancel).await?;
        let count = templates.len();
        for template in templates {
            self.delete(&template.id, cancel).await?;
        }
        Ok(count)
    }

    async fn read_template(&self, path: &Path) -> Result<LocalTemplate, LocalTemplateError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LocalTemplateError::Io { verb: "read", source })?;
        let template: WebhookTemplate = webhook_core::parse_jsonc(&text).map_err(jsonc_to_io)?;
        let metadata = template.metadata.clone().ok_or_else(|| {
            LocalTemplateError::NotManaged(path.display().to_string())
        })?;

        let downloaded_at = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => chrono::DateTime::<Utc>::from(modified)
                .to_rfc3339_opts(SecondsFormat::Nanos, true),
            Err(_) => Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        };

        Ok(LocalTemplate {
            id: metadata.id.clone(),
            metadata,
            template,
            downloaded_at,
            file_path: path.to_path_buf(),
        })
    }
}

fn jsonc_to_io(err: JsoncError) -> LocalTemplateError {
    LocalTemplateError::Io {
        verb: "parse",
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(id: &str) -> TemplateMetadata {
        TemplateMetadata {
            id: id.to_string(),
            name: "GitHub push".to_string(),
            provider: "github".to_string(),
            event: "push".to_string(),
            file: format!("github/{id}.jsonc"),
            description: None,
        }
    }

    fn template() -> WebhookTemplate {
        WebhookTemplate {
            method: "POST".to_string(),
            url: None,
            provider: Some("github".to_string()),
            event: Some("push".to_string()),
            description: None,
            headers: Vec::new(),
            body: serde_json::json!({"ok": true}),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn save_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalTemplateStore::new(dir.path());
        let cancel = CancellationToken::new();
        store
            .save(&metadata("github-push"), template(), &cancel)
            .await
            .unwrap();

        let listed = store.list(&cancel).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "github-push");
    }

    #[tokio::test]
    async fn delete_removes_managed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalTemplateStore::new(dir.path());
        let cancel = CancellationToken::new();
        store
            .save(&metadata("github-push"), template(), &cancel)
            .await
            .unwrap();

        store.delete("github-push", &cancel).await.unwrap();
        assert!(store.list(&cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalTemplateStore::new(dir.path());
        let cancel = CancellationToken::new();
        let err = store.delete("nope", &cancel).await.unwrap_err();
        assert!(matches!(err, LocalTemplateError::NotFound(_)));
    }
}
