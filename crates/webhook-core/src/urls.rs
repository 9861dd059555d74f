//! Absolute http(s) URL validation and relative-reference resolution,
//! shared by the replay service and the template runner.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("invalid URL: {0}")]
    Invalid(String),
    #[error("URL must be absolute")]
    NotAbsolute,
    #[error("URL scheme must be http or https, found {0:?}")]
    UnsupportedScheme(String),
}

/// Parses and validates `raw` as an absolute `http`/`https` URL.
pub fn parse_absolute_http_url(raw: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(raw).map_err(|e| UrlValidationError::Invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(UrlValidationError::NotAbsolute);
    }
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }
}

/// Resolves `relative` (a captured URL or path, falling back to `/` when
/// empty) against `base`, which must already be an absolute http(s)
/// URL.
pub fn resolve_relative(base: &Url, relative: &str) -> Result<Url, UrlValidationError> {
    let relative = if relative.is_empty() { "/" } else { relative };
    base.join(relative)
        .map_err(|e| UrlValidationError::Invalid(e.to_string()))
}
