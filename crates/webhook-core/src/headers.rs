//! Header utilities (C3): the hop-by-hop filter, the override-merge
//! rule, and HTTP method token validation. Shared by the replay service
//! and the template runner so both follow the exact same forwarding
//! rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single header key/value pair. Order and duplicates are significant
/// — capture records and templates never deduplicate headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub key: String,
    pub value: String,
}

impl HeaderPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Headers that are connection-specific per RFC 7230 §6.1 and must never
/// be forwarded by a replay or a template run.
pub const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

#[must_use]
pub fn is_hop_by_hop(key: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(key))
}

/// Drops empty keys and hop-by-hop headers, preserving the order and
/// duplicate count of everything else.
#[must_use]
pub fn drop_hop_by_hop(headers: &[HeaderPair]) -> Vec<HeaderPair> {
    headers
        .iter()
        .filter(|h| !h.key.trim().is_empty() && !is_hop_by_hop(&h.key))
        .cloned()
        .collect()
}

/// Merges `overrides` into `base`.
///
/// For each override key: if `base` already has one or more entries with
/// the same case-insensitive key, every one of those entries keeps its
/// position but has its value replaced (the duplicate count is
/// preserved). If `base` has no entry for that key, the override is
/// appended at the end, in override order.
#[must_use]
pub fn merge_headers(base: &[HeaderPair], overrides: &[HeaderPair]) -> Vec<HeaderPair> {
    let mut merged = base.to_vec();
    let mut appended: Vec<HeaderPair> = Vec::new();

    for over in overrides {
        let matches_base = merged.iter().any(|h| h.key.eq_ignore_ascii_case(&over.key));
        if matches_base {
            for h in &mut merged {
                if h.key.eq_ignore_ascii_case(&over.key) {
                    h.value = over.value.clone();
                }
            }
            continue;
        }
        if let Some(existing) = appended
            .iter_mut()
            .find(|h: &&mut HeaderPair| h.key.eq_ignore_ascii_case(&over.key))
        {
            existing.value = over.value.clone();
        } else {
            appended.push(over.clone());
        }
    }

    merged.extend(appended);
    merged
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MethodError {
    #[error("HTTP method cannot be empty")]
    Empty,
    #[error("invalid HTTP method token: {0:?}")]
    InvalidToken(String),
}

/// Validates `method` as an HTTP token (RFC 7230 §3.2.6: one or more
/// alphanumeric or `!#$%&'*+-.^_`|~` characters) and returns it
/// uppercased.
pub fn validate_method_token(method: &str) -> Result<String, MethodError> {
    if method.is_empty() {
        return Err(MethodError::Empty);
    }
    let is_token_char = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if !method.chars().all(is_token_char) {
        return Err(MethodError::InvalidToken(method.to_string()));
    }
    Ok(method.to_ascii_uppercase())
}
