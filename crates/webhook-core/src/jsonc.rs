//! JSONC → strict JSON standardisation.
//!
//! Capture records and downloaded templates are read as JSONC (comments
//! and trailing commas tolerated) but always written back out as strict
//! JSON, so every file on disk stays machine-parseable even though a
//! human is free to annotate it.

use jsonc_parser::{parse_to_serde_value, ParseOptions};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsoncError {
    #[error("invalid JSONC: {0}")]
    Parse(String),
    #[error("JSONC parsed but did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Parses `text` as JSONC and deserialises the result into `T`.
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<T, JsoncError> {
    let value = parse_to_serde_value(text, &ParseOptions::default())
        .map_err(|e| JsoncError::Parse(e.to_string()))?
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(JsoncError::Shape)
}

/// Serialises `value` as pretty-printed strict JSON (2-space indent)
/// followed by a single trailing newline — the on-disk format for
/// capture records and local templates.
pub fn to_pretty_string<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}
