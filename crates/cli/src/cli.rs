//! The clap argument tree: one struct/enum per spec.md §6 CLI surface
//! entry. Handlers live in [`crate::commands`]; this module only
//! describes shape and help text.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "better-webhook")]
#[command(about = "Capture, inspect, replay, and template real inbound webhooks on localhost")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (overrides BETTER_WEBHOOK_CONFIG and
    /// the default ~/.better-webhook/config.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the localhost capture server.
    Capture {
        /// Host to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind.
        #[arg(long, default_value_t = 4242)]
        port: u16,

        /// Raise the log filter to debug.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Inspect and manage stored captures.
    Captures {
        #[command(subcommand)]
        action: CapturesCommands,
    },

    /// Browse, download, and run webhook templates.
    Templates {
        #[command(subcommand)]
        action: TemplatesCommands,
    },

    /// Write a default config.toml to the resolved config path.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum CapturesCommands {
    /// List stored captures, most recent first.
    List {
        /// Maximum number of captures to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Filter by detected provider.
        #[arg(long)]
        provider: Option<String>,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a capture by id or unique id prefix.
    Delete {
        /// Capture id or a unique prefix of one.
        selector: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Re-send a stored capture against a live target.
    Replay {
        /// Capture id or a unique prefix of one.
        selector: String,

        /// Absolute URL to send the request to verbatim, ignoring the
        /// captured path and query.
        target_url: Option<String>,

        /// Absolute base URL the captured path and query are resolved
        /// against. Required when `target-url` is omitted.
        #[arg(long)]
        base_url: Option<String>,

        /// Override the HTTP method (default: the captured method).
        #[arg(long)]
        method: Option<String>,

        /// Extra or replacement header, `key:value`. Repeatable.
        #[arg(short = 'H', long = "header")]
        header: Vec<String>,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Raise the log filter to debug.
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Subcommand)]
pub enum TemplatesCommands {
    /// List templates from the remote index.
    List {
        #[arg(long)]
        provider: Option<String>,

        /// Bypass the index cache and force a remote fetch.
        #[arg(long)]
        refresh: bool,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List templates already downloaded locally.
    Local {
        #[arg(long)]
        provider: Option<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Download one template, or every template in the index.
    Download {
        /// Template id to download.
        id: Option<String>,

        /// Download every template in the index not already present
        /// locally.
        #[arg(long)]
        all: bool,

        /// Bypass the index cache and force a remote fetch.
        #[arg(long)]
        refresh: bool,
    },

    /// Search local and remote templates by substring.
    Search {
        query: String,

        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        refresh: bool,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve a local template's placeholders and dispatch it.
    Run {
        /// Template id.
        id: String,

        /// Absolute URL to send the request to (default: the
        /// template's own `url`).
        target_url: Option<String>,

        /// Signing secret (default: GITHUB_WEBHOOK_SECRET or
        /// WEBHOOK_SECRET from the environment).
        #[arg(long)]
        secret: Option<String>,

        /// Allow `$env:NAME` placeholders to read the process
        /// environment.
        #[arg(long)]
        allow_env_placeholders: bool,

        /// Extra or replacement header, `key:value`. Repeatable.
        #[arg(short = 'H', long = "header")]
        header: Vec<String>,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Raise the log filter to debug.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Clear the cached remote index.
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Delete every downloaded template.
    Clean {
        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Delete the on-disk index cache.
    Clear,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a `key:value` header flag, as accepted by `-H`/`--header`.
pub fn parse_header_flag(raw: &str) -> anyhow::Result<webhook_core::HeaderPair> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("header {raw:?} must be in key:value form"))?;
    Ok(webhook_core::HeaderPair::new(
        key.trim(),
        value.trim().to_string(),
    ))
}
