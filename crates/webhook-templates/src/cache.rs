//! The remote index cache: a single JSON file recording the last
//! fetched index and when it was fetched, so repeated lookups within
//! the TTL avoid a network round trip.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{CachedIndex, TemplatesIndex};

#[derive(Debug, Error)]
pub enum IndexCacheError {
    #[error("failed to {verb} index cache: {source}")]
    Io {
        verb: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialise index cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes `<templates_dir>/.index-cache.json`.
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    #[must_use]
    pub fn new(templates_dir: &Path) -> Self {
        Self {
            path: templates_dir.join(".index-cache.json"),
        }
    }

    /// Returns the cached entry, or `None` if the file is absent,
    /// unreadable, or fails to parse — a missing cache is a legitimate
    /// state, not an error.
    pub async fn get(&self) -> Option<CachedIndex> {
        let text = tokio::fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Overwrites the cache atomically.
    pub async fn set(
        &self,
        index: &TemplatesIndex,
        cached_at: DateTime<Utc>,
    ) -> Result<(), IndexCacheError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| IndexCacheError::Io { verb: "create", source })?;
        }
        let entry = CachedIndex {
            index: index.clone(),
            cached_at,
        };
        let body = serde_json::to_string_pretty(&entry)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, body.as_bytes())
            .await
            .map_err(|source| IndexCacheError::Io { verb: "write", source })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| IndexCacheError::Io { verb: "rename", source })
    }

    /// Removes the cache file. Absence is not an error.
    pub async fn clear(&self) -> Result<(), IndexCacheError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(IndexCacheError::Io { verb: "delete", source }),
        }
    }
}
