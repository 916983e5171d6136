//! Input checks shared by the handlers.
//!
//! Every check returns the client-facing message on failure; handlers turn
//! that into a 400.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::http::request::{ParsedRequest, RequestBody};

pub const DEFAULT_PAGE: usize = 20;
pub const MAX_PAGE: usize = 50;

pub type Rejection = String;

/// Optional string field. Absent and `null` are `None`; other JSON types are rejected.
pub fn text<'a>(body: &'a RequestBody, key: &str) -> Result<Option<&'a str>, Rejection> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("Invalid {key}")),
    }
}

/// Optional string field where the empty string counts as absent.
pub fn non_empty<'a>(body: &'a RequestBody, key: &str) -> Result<Option<&'a str>, Rejection> {
    Ok(text(body, key)?.filter(|s| !s.is_empty()))
}

/// Length in characters, not bytes.
pub fn max_len(value: &str, field: &str, max: usize) -> Result<(), Rejection> {
    if value.chars().count() > max {
        Err(format!("{field} must be {max} characters or fewer"))
    } else {
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Image references must be hosted https URLs; inline `data:` payloads are refused.
pub fn https_url(value: &str, field: &str) -> Result<(), Rejection> {
    if value.starts_with("data:") {
        return Err("Base64 images are not accepted. Upload the image and provide its URL.".into());
    }
    if !value.starts_with("https://") {
        return Err(format!("{field} must be a valid HTTPS URL"));
    }
    Ok(())
}

/// RFC 3339 timestamp.
pub fn timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, Rejection> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| format!("{field} must be a valid ISO 8601 date string"))
}

/// `limit` query parameter: default 20, capped at 50. Unparseable or zero falls back to the default.
pub fn page_limit(req: &ParsedRequest) -> usize {
    req.query("limit")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .map_or(DEFAULT_PAGE, |n| n.min(MAX_PAGE))
}

/// `cursor` query parameter as a timestamp.
pub fn cursor(req: &ParsedRequest) -> Result<Option<DateTime<Utc>>, Rejection> {
    match req.query("cursor").filter(|c| !c.is_empty()) {
        None => Ok(None),
        Some(raw) => timestamp(raw, "cursor").map(Some),
    }
}
