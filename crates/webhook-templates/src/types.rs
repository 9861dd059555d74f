//! The template data model: what the remote index describes, what a
//! downloaded template file holds, and what lives in the local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use webhook_core::HeaderPair;

/// One entry in a remote templates index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub event: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TemplateMetadata {
    fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.provider.trim().is_empty()
            && !self.event.trim().is_empty()
            && self.file.ends_with(".jsonc")
    }
}

/// The remote `templates.jsonc` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesIndex {
    pub version: String,
    pub templates: Vec<TemplateMetadata>,
}

impl TemplatesIndex {
    /// An index must list at least one well-formed template. Older
    /// client generations tolerated an empty list; this implementation
    /// rejects it.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.templates.is_empty() {
            return Err("templates index must not be empty");
        }
        if self.templates.iter().any(|t| !t.is_well_formed()) {
            return Err("templates index contains a malformed entry");
        }
        Ok(())
    }
}

/// The downloadable request description a template file holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTemplate {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderPair>,
    pub body: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_metadata")]
    pub metadata: Option<TemplateMetadata>,
}

fn default_method() -> String {
    "POST".to_string()
}

/// A template that has been downloaded and persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalTemplate {
    pub id: String,
    pub metadata: TemplateMetadata,
    pub template: WebhookTemplate,
    pub downloaded_at: String,
    #[serde(skip)]
    pub file_path: std::path::PathBuf,
}

/// The cached remote index, with the instant it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedIndex {
    pub index: TemplatesIndex,
    pub cached_at: DateTime<Utc>,
}
