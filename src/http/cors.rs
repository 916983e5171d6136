//! Cross-origin headers.
//!
//! The allowed-methods list is computed once from the frozen route table and
//! every response builder starts from a copy of the resulting header set, so
//! error and 404 responses carry CORS headers too.

use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::http::response::ResponseBuilder;

const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone)]
pub struct Cors {
    headers: HeaderMap,
}

impl Cors {
    /// Build the header set for the given registered methods.
    ///
    /// Methods are listed once each, in first-seen order, followed by OPTIONS.
    pub fn for_methods<'a>(methods: impl IntoIterator<Item = &'a Method>) -> Self {
        let mut seen: Vec<&Method> = Vec::new();
        for method in methods {
            if *method != Method::OPTIONS && !seen.contains(&method) {
                seen.push(method);
            }
        }
        let mut allowed: Vec<&str> = seen.iter().map(|m| m.as_str()).collect();
        allowed.push(Method::OPTIONS.as_str());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        // Method tokens are plain ASCII, so this never falls back.
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
        }

        Self { headers }
    }

    /// A fresh builder carrying the CORS headers.
    pub fn seed(&self) -> ResponseBuilder {
        ResponseBuilder::with_headers(self.headers.clone())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
