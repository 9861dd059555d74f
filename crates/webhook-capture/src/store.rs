//! The on-disk capture store: one JSONC file per captured request,
//! named so that directory listings already sort chronologically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use webhook_core::{safe_join, Cancelled, Clock, IdGenerator, JsoncError};

use crate::record::{CaptureFile, CaptureRecord};

#[derive(Debug, Error)]
pub enum CaptureStoreError {
    #[error("failed to {verb} capture store: {source}")]
    Io {
        verb: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialise capture record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("selector must not be empty")]
    EmptySelector,
    #[error("no capture matches selector {0:?}")]
    NotFound(String),
    #[error("selector {0:?} matches more than one capture")]
    Ambiguous(String),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Persists and retrieves [`CaptureRecord`]s under a single root
/// directory. Every write is a temp-file-then-rename so a reader never
/// observes a partially written file.
pub struct CaptureStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    capture_tool_version: String,
}

impl CaptureStore {
    pub fn new(
        root: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        capture_tool_version: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            clock,
            ids,
            capture_tool_version: capture_tool_version.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds a fresh, mostly-empty record ready for the caller to fill
    /// in with the inbound request's method, URL, headers, and body.
    #[must_use]
    pub fn build_base_record(&self) -> CaptureRecord {
        CaptureRecord::base(self.ids.new_id(), self.clock.now(), &self.capture_tool_version)
    }

    /// Creates the store root (and its parents) if it does not exist
    /// yet, with owner-only permissions on Unix.
    pub async fn ensure_root(&self, cancel: &CancellationToken) -> Result<(), CaptureStoreError> {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| CaptureStoreError::Io {
                verb: "create",
                source,
            })?;
        set_private_permissions(&self.root).await?;
        Ok(())
    }

    /// Writes `record` to disk atomically and returns the file name it
    /// was stored under.
    pub async fn save(
        &self,
        record: &CaptureRecord,
        cancel: &CancellationToken,
    ) -> Result<String, CaptureStoreError> {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        self.ensure_root(cancel).await?;
        let file_name = CaptureFile::file_name_for(record);
        let final_path =
            safe_join(&self.root, &file_name).map_err(|_| CaptureStoreError::Io {
                verb: "name",
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "capture file name escaped the store root",
                ),
            })?;
        let body = webhook_core::to_pretty_string(record)?;

        let tmp_path = final_path.with_extension("jsonc.tmp");
        tokio::fs::write(&tmp_path, body.as_bytes())
            .await
            .map_err(|source| CaptureStoreError::Io {
                verb: "write",
                source,
            })?;
        set_private_file_permissions(&tmp_path).await?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|source| CaptureStoreError::Io {
                verb: "rename",
                source,
            })?;

        tracing::info!(capture_id = %record.id, file = %file_name, "capture stored");
        Ok(file_name)
    }

    /// Lists up to `limit` captures, most recent first. Files that fail
    /// to parse are logged and skipped rather than aborting the listing.
    pub async fn list(
        &self,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CaptureFile>, CaptureStoreError> {
        let mut names = self.read_file_names(cancel).await?;
        names.sort_unstable_by(|a, b| b.cmp(a));

        let mut out = Vec::new();
        for name in names {
            if cancel.is_cancelled() {
                return Err(Cancelled.into());
            }
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
            match self.read_record(&name).await {
                Ok(record) => out.push(CaptureFile {
                    file_name: name,
                    record,
                }),
                Err(err) => {
                    tracing::warn!(file = %name, error = %err, "skipping unreadable capture file");
                }
            }
        }
        Ok(out)
    }

    /// Resolves `selector` against stored capture ids: an exact id match
    /// wins outright, otherwise a unique id-prefix match wins, otherwise
    /// `NotFound`/`Ambiguous`.
    pub async fn resolve_by_id_or_prefix(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<CaptureFile, CaptureStoreError> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(CaptureStoreError::EmptySelector);
        }
        let names = self.read_file_names(cancel).await?;
        let mut exact = None;
        let mut prefix_matches = Vec::new();

        for name in names {
            if cancel.is_cancelled() {
                return Err(Cancelled.into());
            }
            let Ok(record) = self.read_record(&name).await else {
                continue;
            };
            if record.id == selector {
                exact = Some(CaptureFile {
                    file_name: name,
                    record,
                });
                break;
            }
            if record.id.starts_with(selector) {
                prefix_matches.push(CaptureFile {
                    file_name: name,
                    record,
                });
            }
        }

        if let Some(hit) = exact {
            return Ok(hit);
        }
        match prefix_matches.len() {
            0 => Err(CaptureStoreError::NotFound(selector.to_string())),
            1 => Ok(prefix_matches.into_iter().next().unwrap()),
            _ => Err(CaptureStoreError::Ambiguous(selector.to_string())),
        }
    }

    /// Deletes the capture matching `selector`, using the same
    /// resolution rule as [`Self::resolve_by_id_or_prefix`].
    pub async fn delete_by_id_or_prefix(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CaptureStoreError> {
        let hit = self.resolve_by_id_or_prefix(selector, cancel).await?;
        let path = self.root.join(&hit.file_name);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| CaptureStoreError::Io {
                verb: "delete",
                source,
            })?;
        Ok(hit.record.id)
    }

    async fn read_file_names(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, CaptureStoreError> {
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new())
            }
            Err(source) => {
                return Err(CaptureStoreError::Io {
                    verb: "read",
                    source,
                })
            }
        };
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| CaptureStoreError::Io { verb: "read", source })?
        {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.ends_with(".jsonc") {
                names.push(file_name.into_owned());
            }
        }
        Ok(names)
    }

    async fn read_record(&self, file_name: &str) -> Result<CaptureRecord, CaptureStoreError> {
        let path = self.root.join(file_name);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| CaptureStoreError::Io { verb: "read", source })?;
        webhook_core::parse_jsonc(&text).map_err(json_err_to_store_err)
    }
}

fn json_err_to_store_err(err: JsoncError) -> CaptureStoreError {
    CaptureStoreError::Io {
        verb: "parse",
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()),
    }
}

#[cfg(unix)]
async fn set_private_permissions(path: &Path) -> Result<(), CaptureStoreError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o700);
    tokio::fs::set_permissions(path, perms)
        .await
        .map_err(|source| CaptureStoreError::Io {
            verb: "chmod",
            source,
        })
}

#[cfg(not(unix))]
async fn set_private_permissions(_path: &Path) -> Result<(), CaptureStoreError> {
    Ok(())
}

#[cfg(unix)]
async fn set_private_file_permissions(path: &Path) -> Result<(), CaptureStoreError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    tokio::fs::set_permissions(path, perms)
        .await
        .map_err(|source| CaptureStoreError::Io {
            verb: "chmod",
            source,
        })
}

#[cfg(not(unix))]
async fn set_private_file_permissions(_path: &Path) -> Result<(), CaptureStoreError> {
    Ok(())
}
