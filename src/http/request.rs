//! Request adapter.
//!
//! # Responsibilities
//! - Convert a native `Request<Body>` into a `ParsedRequest`, once per request
//! - Normalize headers for case-insensitive lookup
//! - Flatten the query string
//! - Parse the body according to its declared content type
//!
//! # Design Decisions
//! - Bodies are only read for POST, PUT and PATCH
//! - A body that cannot be read or parsed becomes an empty JSON object; that
//!   is not an error condition
//! - Reads are capped at the configured body limit; over-limit bodies are
//!   treated as unreadable

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request};
use serde_json::{Map, Value};

use crate::error::HandlerError;
use crate::routing::RouteParams;
use crate::security::token::Claims;

/// Case-insensitive header lookup. Keys are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&HeaderMap> for Headers {
    /// Repeated headers are joined with ", "; values that are not visible
    /// ASCII are dropped.
    fn from(map: &HeaderMap) -> Self {
        let mut headers: HashMap<String, String> = HashMap::with_capacity(map.keys_len());
        for (name, value) in map {
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        Self(headers)
    }
}

/// Parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

impl RequestBody {
    pub fn empty() -> Self {
        RequestBody::Json(Value::Object(Map::new()))
    }

    /// Top-level field of a JSON object body. `None` for text bodies.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => value.get(key),
            RequestBody::Text(_) => None,
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

/// The framework's view of one inbound request.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: Headers,
    pub body: RequestBody,
    /// Filled by the router from the matched pattern.
    pub params: RouteParams,
    /// Filled by the auth gate.
    pub auth: Option<Claims>,
}

impl ParsedRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: Headers::default(),
            body: RequestBody::empty(),
            params: RouteParams::new(),
            auth: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.insert(key.to_string(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Claims attached by the auth gate.
    ///
    /// Only fails when a handler that expects a principal is mounted without
    /// the gate, which the router reports as a 500.
    pub fn principal(&self) -> Result<&Claims, HandlerError> {
        self.auth.as_ref().ok_or(HandlerError::Unauthenticated)
    }

    /// Adapt a native request. Never fails.
    pub async fn from_native(req: Request<Body>, max_body_size: usize) -> Self {
        let (parts, body) = req.into_parts();
        let headers = Headers::from(&parts.headers);
        let query = parts.uri.query().map(parse_query).unwrap_or_default();

        let body = if carries_body(&parts.method) {
            read_body(body, &headers, max_body_size).await
        } else {
            RequestBody::empty()
        };

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query,
            headers,
            body,
            params: RouteParams::new(),
            auth: None,
        }
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Last value wins for repeated keys.
fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

async fn read_body(body: Body, headers: &Headers, limit: usize) -> RequestBody {
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit, "Request body unreadable, using empty body");
            return RequestBody::empty();
        }
    };

    let is_json = headers
        .get(header::CONTENT_TYPE.as_str())
        .is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        match serde_json::from_slice(&bytes) {
            Ok(value) => RequestBody::Json(value),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed JSON body, using empty body");
                RequestBody::empty()
            }
        }
    } else {
        RequestBody::Text(String::from_utf8_lossy(&bytes).into_owned())
    }
}
