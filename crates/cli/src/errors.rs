//! Maps every library error kind to the short, backtrace-free message
//! spec.md §7 assigns it. The CLI never matches on `.to_string()` —
//! every mapping below switches on the concrete error enum.

use thiserror::Error;
use webhook_capture::CaptureStoreError;
use webhook_config::ConfigError;
use webhook_core::{Cancelled, PlaceholderError};
use webhook_replay::ReplayError;
use webhook_templates::TemplateServiceError;

/// The CLI-wide error type: every command handler returns this, so
/// `main` can match on a closed set of kinds instead of downcasting an
/// `anyhow::Error`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
    #[error(transparent)]
    Store(#[from] CaptureStoreError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Templates(#[from] TemplateServiceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
}

impl From<Cancelled> for CliError {
    fn from(_: Cancelled) -> Self {
        CliError::Cancelled
    }
}

impl CliError {
    /// Renders the exact user-facing message from spec.md §7, falling
    /// back to the error's own `Display` for kinds the table leaves
    /// unspecified.
    pub fn user_message(&self) -> String {
        match self {
            CliError::Cancelled => "operation cancelled".to_string(),
            CliError::Store(CaptureStoreError::EmptySelector) => {
                "capture selector cannot be empty".to_string()
            }
            CliError::Store(CaptureStoreError::NotFound(selector)) => {
                format!("no capture matches selector {selector:?}")
            }
            CliError::Store(CaptureStoreError::Ambiguous(selector)) => format!(
                "selector {selector:?} matches more than one capture; use a longer prefix"
            ),
            CliError::Placeholder(PlaceholderError::EnvironmentPlaceholdersDisabled) => {
                "environment variable placeholders are disabled; pass --allow-env-placeholders"
                    .to_string()
            }
            CliError::Templates(TemplateServiceError::RunSecretRequired) => {
                "this template requires a webhook secret; pass --secret or set \
                 GITHUB_WEBHOOK_SECRET/WEBHOOK_SECRET"
                    .to_string()
            }
            CliError::Templates(TemplateServiceError::RunTargetUrlRequired) => {
                "this template has no url; pass a target URL".to_string()
            }
            other => other.to_string(),
        }
    }
}
