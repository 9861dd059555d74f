//! The template subsystem: remote/local stores, the index cache, and
//! the service that lists, searches, downloads, and runs templates.

pub mod cache;
pub mod local;
pub mod remote;
pub mod service;
pub mod types;

pub use cache::{IndexCache, IndexCacheError};
pub use local::{LocalTemplateError, LocalTemplateStore};
pub use remote::{RemoteTemplateClient, RemoteTemplateError, MAX_RESPONSE_BYTES};
pub use service::{
    DownloadAllOutcome, RemoteTemplateListing, RunOutcome, RunRequest, SearchResults,
    TemplateService, TemplateServiceError, INDEX_TTL,
};
pub use types::{CachedIndex, LocalTemplate, TemplateMetadata, TemplatesIndex, WebhookTemplate};

/// Default remote base URL when the user hasn't overridden it.
pub const DEFAULT_REMOTE_BASE_URL: &str =
    "https://raw.githubusercontent.com/endalk200/better-webhook/main";
