//! Shared primitives for the better-webhook toolkit.
//!
//! This crate has no I/O of its own: it provides the injectable clock/
//! id/env sources (C1), file-name and URL safety checks (C2), header
//! utilities (C3), the placeholder resolver (C4), and JSONC
//! standardisation shared by the capture store and the template store.

pub mod cancellation;
pub mod clock;
pub mod env;
pub mod headers;
pub mod ids;
pub mod jsonc;
pub mod paths;
pub mod placeholder;
pub mod urls;

pub use cancellation::Cancelled;
pub use clock::{Clock, FixedClock, SystemClock};
pub use env::{EnvLookup, MapEnv, SystemEnv};
pub use headers::{
    drop_hop_by_hop, is_hop_by_hop, merge_headers, validate_method_token, HeaderPair,
    MethodError, HOP_BY_HOP,
};
pub use ids::{IdGenerator, SequenceIdGenerator, UuidGenerator};
pub use jsonc::{parse as parse_jsonc, to_pretty_string, JsoncError};
pub use paths::{safe_join, safe_join_relative, PathSafetyError};
pub use placeholder::{
    github_hmac_hex, HeaderResolveContext, PlaceholderError, PlaceholderResolver,
};
pub use urls::{parse_absolute_http_url, resolve_relative, UrlValidationError};

/// The version string embedded in every capture record's
/// `meta.capture_tool_version` field, and printed by `--version`.
pub const CAPTURE_TOOL_VERSION: &str = concat!("better-webhook/", env!("CARGO_PKG_VERSION"));
