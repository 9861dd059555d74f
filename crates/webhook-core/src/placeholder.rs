//! The `$`-prefixed placeholder resolver (C4).
//!
//! Recognises `$uuid`, `$time:unix`, `$time:rfc3339`, `$env:NAME`, and —
//! in header values only — the GitHub signature placeholder. The
//! tokeniser is a single-pass scanner over the input's characters so
//! that `\$` escape handling stays deterministic regardless of what
//! follows.

use std::sync::Arc;

use chrono::SecondsFormat;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use crate::clock::Clock;
use crate::env::EnvLookup;
use crate::ids::IdGenerator;

type HmacSha256 = Hmac<Sha256>;

/// The legacy literal accepted, for backward compatibility only, in
/// place of `$github:x-hub-signature-256`.
const LEGACY_SIGNATURE_PLACEHOLDER: &str = "placeholder";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("invalid JSON body: {0}")]
    InvalidJsonBody(String),
    #[error("unsupported $time format: {0:?}")]
    UnsupportedTimeFormat(String),
    #[error("missing environment variable: {0}")]
    MissingEnvironmentVariable(String),
    #[error("environment variable placeholders are disabled (pass --allow-env-placeholders)")]
    EnvironmentPlaceholdersDisabled,
    #[error("unsupported $github token: {0:?}")]
    UnsupportedProviderToken(String),
    #[error("a secret is required to compute this signature")]
    MissingSecret,
}

/// Context used while resolving a header value: the GitHub signature
/// placeholder needs the provider, the already-resolved body bytes, and
/// the signing secret.
#[derive(Debug, Clone, Default)]
pub struct HeaderResolveContext {
    pub provider: String,
    pub body: Vec<u8>,
    pub secret: String,
}

/// Resolves `$`-prefixed placeholders in template bodies and header
/// values, given injected sources of time, ids, and environment
/// variables.
pub struct PlaceholderResolver {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    env: Arc<dyn EnvLookup>,
    pub allow_env_placeholders: bool,
}

impl PlaceholderResolver {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>, env: Arc<dyn EnvLookup>) -> Self {
        Self {
            clock,
            ids,
            env,
            allow_env_placeholders: false,
        }
    }

    /// Returns a copy with `allow_env_placeholders` set, sharing the
    /// same injected clock/id/env sources. Used by the template runner
    /// to honour `--allow-env-placeholders` per invocation.
    #[must_use]
    pub fn with_env_placeholders_allowed(&self, allow: bool) -> Self {
        Self {
            clock: self.clock.clone(),
            ids: self.ids.clone(),
            env: self.env.clone(),
            allow_env_placeholders: allow,
        }
    }

    /// Parses `raw` as JSON, resolves every string leaf, and re-encodes
    /// as compact JSON. Empty/blank input resolves to empty bytes.
    pub fn resolve_body(&self, raw: &str) -> Result<Vec<u8>, PlaceholderError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| PlaceholderError::InvalidJsonBody(e.to_string()))?;
        self.resolve_json(&value)
    }

    /// Same as [`Self::resolve_body`] but starts from an already-parsed
    /// JSON value (the common path: `WebhookTemplate::body` is stored as
    /// a `serde_json::Value`).
    pub fn resolve_json(&self, body: &Value) -> Result<Vec<u8>, PlaceholderError> {
        let resolved = self.resolve_value(body.clone())?;
        Ok(serde_json::to_vec(&resolved).expect("serde_json::Value always serialises"))
    }

    fn resolve_value(&self, value: Value) -> Result<Value, PlaceholderError> {
        match value {
            Value::String(s) => Ok(Value::String(self.resolve_str(&s)?)),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve_value(item)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k, self.resolve_value(v)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other),
        }
    }

    /// Resolves placeholders in a single string leaf.
    pub fn resolve_str(&self, input: &str) -> Result<String, PlaceholderError> {
        let chars: Vec<char> = input.chars().collect();
        let mut out = String::with_capacity(input.len());
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if c == '\\' && chars.get(i + 1) == Some(&'$') {
                out.push('$');
                i += 2;
                continue;
            }
            if c != '$' {
                out.push(c);
                i += 1;
                continue;
            }

            let rest: String = chars[i + 1..].iter().collect();

            if let Some((replacement, consumed)) =
                self.try_fixed_token(&rest, "uuid", || Ok(self.ids.new_id()))?
            {
                out.push_str(&replacement);
                i += 1 + consumed;
                continue;
            }
            if let Some((replacement, consumed)) = self.try_fixed_token(&rest, "time:unix", || {
                Ok(self.clock.now().timestamp().to_string())
            })? {
                out.push_str(&replacement);
                i += 1 + consumed;
                continue;
            }
            if let Some((replacement, consumed)) =
                self.try_fixed_token(&rest, "time:rfc3339", || {
                    Ok(self.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true))
                })?
            {
                out.push_str(&replacement);
                i += 1 + consumed;
                continue;
            }
            if let Some(name) = rest.strip_prefix("time:") {
                return Err(PlaceholderError::UnsupportedTimeFormat(
                    scan_token_name(name).to_string(),
                ));
            }
            if let Some(name_and_tail) = rest.strip_prefix("env:") {
                let name = scan_token_name(name_and_tail);
                if name.is_empty() {
                    return Err(PlaceholderError::MissingEnvironmentVariable(String::new()));
                }
                if !self.allow_env_placeholders {
                    return Err(PlaceholderError::EnvironmentPlaceholdersDisabled);
                }
                let value = self.env.get(name).ok_or_else(|| {
                    PlaceholderError::MissingEnvironmentVariable(name.to_string())
                })?;
                out.push_str(&value);
                i += 1 + "env:".len() + name.chars().count();
                continue;
            }
            if let Some(token) = rest.strip_prefix("github:") {
                // `$github:x-hub-signature-256` is only meaningful in a
                // header value (resolved by `resolve_header_value`); any
                // other `$github:*` token, including this one inside a
                // body, is unsupported.
                return Err(PlaceholderError::UnsupportedProviderToken(format!(
                    "github:{}",
                    scan_hyphenated_token_name(token)
                )));
            }

            // Not a recognised placeholder: emit the '$' literally.
            out.push('$');
            i += 1;
        }
        Ok(out)
    }

    /// Tries to match a fixed-form token (`uuid`, `time:unix`,
    /// `time:rfc3339`) at the start of `rest`, honouring the
    /// token-boundary rule: the character following the token must not
    /// be an identifier character, or adjacent text would merge into it.
    fn try_fixed_token(
        &self,
        rest: &str,
        token: &str,
        compute: impl FnOnce() -> Result<String, PlaceholderError>,
    ) -> Result<Option<(String, usize)>, PlaceholderError> {
        if !rest.starts_with(token) {
            return Ok(None);
        }
        let after = rest[token.len()..].chars().next();
        if after.is_some_and(is_ident_char) {
            return Ok(None);
        }
        Ok(Some((compute()?, token.chars().count())))
    }

    /// Resolves a single header value, applying the GitHub signature
    /// special case before falling back to ordinary token interpolation.
    pub fn resolve_header_value(
        &self,
        key: &str,
        value: &str,
        ctx: &HeaderResolveContext,
    ) -> Result<String, PlaceholderError> {
        let is_signature_header = key.eq_ignore_ascii_case("x-hub-signature-256");
        let is_signature_placeholder =
            value == "$github:x-hub-signature-256" || value == LEGACY_SIGNATURE_PLACEHOLDER;

        if is_signature_header && ctx.provider.eq_ignore_ascii_case("github") && is_signature_placeholder
        {
            if ctx.secret.is_empty() {
                return Err(PlaceholderError::MissingSecret);
            }
            return Ok(format!("sha256={}", github_hmac_hex(&ctx.secret, &ctx.body)));
        }

        self.resolve_str(value)
    }
}

/// Computes the hex-encoded HMAC-SHA256 of `body` keyed by `secret`, as
/// used for the GitHub `X-Hub-Signature-256` header.
#[must_use]
pub fn github_hmac_hex(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scans a maximal run of `[A-Za-z0-9_]` characters from the start of
/// `s` — the grammar shared by `$env:NAME` and the diagnostic token name
/// reported in `UnsupportedTimeFormat`/`UnsupportedProviderToken`.
fn scan_token_name(s: &str) -> &str {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    &s[..end]
}

/// Like [`scan_token_name`] but also accepts `-`, matching HTTP header
/// name tokens such as `x-hub-signature-256`.
fn scan_hyphenated_token_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(is_ident_char(c) || c == '-'))
        .unwrap_or(s.len());
    &s[..end]
}
