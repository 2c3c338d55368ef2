// Allow expect in this module: regex patterns are compile-time verified
#![allow(clippy::expect_used)]

//! Identifier and payload validation.
//!
//! Every externally supplied identifier becomes a path component under the
//! data root, so the whitelist is strict: alphanumeric start, then
//! alphanumerics, underscores, and hyphens. `.`, `..`, separators, and
//! leading `-` can never pass.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SAFE_ID_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]{0,127}$").expect("valid regex pattern");
    static ref CLIENT_ID_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]{0,255}$").expect("valid regex pattern");
}

/// Validate a project, agent, or resource identifier (1-128 chars).
pub fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if SAFE_ID_RE.is_match(value) {
        return Ok(());
    }
    Err(Error::InvalidId {
        field,
        provided: value.to_string(),
    })
}

/// Validate a client id (1-256 chars, same character whitelist).
pub fn validate_client_id(value: &str) -> Result<()> {
    if CLIENT_ID_RE.is_match(value) {
        return Ok(());
    }
    Err(Error::InvalidId {
        field: "client_id",
        provided: value.to_string(),
    })
}

/// Check a payload's byte size against `limit`.
pub fn validate_payload_size(actual: usize, limit: usize) -> Result<()> {
    if actual <= limit {
        return Ok(());
    }
    Err(Error::PayloadTooLarge { actual, limit })
}

/// Walk a JSON value and reject nesting deeper than `max_depth` levels.
///
/// Plain strings and numbers have depth 1; each surrounding array or object
/// adds one. The walk stops descending as soon as the limit is exceeded, so
/// it never recurses more than `max_depth + 1` frames.
pub fn validate_json_depth(value: &serde_json::Value, max_depth: usize) -> Result<()> {
    fn walk(value: &serde_json::Value, depth: usize, max_depth: usize) -> Result<()> {
        if depth > max_depth {
            return Err(Error::PayloadTooDeep { max_depth });
        }
        match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    walk(item, depth + 1, max_depth)?;
                }
            }
            serde_json::Value::Object(map) => {
                for item in map.values() {
                    walk(item, depth + 1, max_depth)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
    walk(value, 1, max_depth)
}
