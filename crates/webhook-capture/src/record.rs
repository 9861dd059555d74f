//! The `CaptureRecord`/`CaptureFile` data model.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use webhook_core::HeaderPair;

/// A single received HTTP request, persisted verbatim.
///
/// Field order here is the on-disk JSONC layout exactly, since
/// `serde_json` serialises struct fields in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: String,
    pub timestamp: String,
    pub method: String,
    pub url: String,
    pub path: String,
    pub headers: Vec<HeaderPair>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_length: Option<u64>,
    pub raw_body_base64: String,
    pub provider: String,
    pub meta: CaptureMeta,
}

/// Capture-tool bookkeeping metadata, separate from the request data
/// itself so it can evolve independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMeta {
    pub stored_at: String,
    pub body_encoding: String,
    pub capture_tool_version: String,
}

impl CaptureRecord {
    /// Builds a fresh record with only the fields that are known before
    /// the request itself is inspected: a new id, the current timestamp,
    /// `provider = "unknown"`, and `meta`.
    #[must_use]
    pub fn base(id: String, now: DateTime<Utc>, capture_tool_version: &str) -> Self {
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
        Self {
            id,
            timestamp: timestamp.clone(),
            method: String::new(),
            url: String::new(),
            path: String::new(),
            headers: Vec::new(),
            content_type: None,
            content_length: None,
            raw_body_base64: String::new(),
            provider: "unknown".to_string(),
            meta: CaptureMeta {
                stored_at: timestamp,
                body_encoding: "base64".to_string(),
                capture_tool_version: capture_tool_version.to_string(),
            },
        }
    }

    /// Decodes [`Self::raw_body_base64`] back to the original bytes.
    pub fn decode_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD.decode(&self.raw_body_base64)
    }
}

/// A capture record paired with the file name it is (or will be) stored
/// under. Filenames sort chronologically: `<rfc3339nano-dashed>_<id8>.jsonc`.
#[derive(Debug, Clone)]
pub struct CaptureFile {
    pub file_name: String,
    pub record: CaptureRecord,
}

impl CaptureFile {
    /// Derives the storage file name for `record`.
    #[must_use]
    pub fn file_name_for(record: &CaptureRecord) -> String {
        let dashed_timestamp = record.timestamp.replace(':', "-");
        let id8: String = record.id.chars().take(8).collect();
        format!("{dashed_timestamp}_{id8}.jsonc")
    }

    #[must_use]
    pub fn new(record: CaptureRecord) -> Self {
        let file_name = Self::file_name_for(&record);
        Self { file_name, record }
    }
}
