//! Response shim.
//!
//! # Responsibilities
//! - Accumulate status and headers for one request
//! - Resolve to exactly one outbound response
//!
//! # Design Decisions
//! - The builder is owned and every finalizing call consumes it, so a second
//!   finalize or a mutation after finalize does not compile
//! - `Finalized` can only be produced here; a handler cannot return `Ok`
//!   without going through the builder

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use serde::Serialize;

use crate::error::{ApiError, HandlerError};

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// Single-use response builder handed to gates and handlers.
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

/// A response that has been resolved. Proof that the builder was consumed.
#[derive(Debug)]
#[must_use = "a finalized response has to be returned to the router"]
pub struct Finalized(Response<Body>);

impl ResponseBuilder {
    pub(crate) fn with_headers(headers: HeaderMap) -> Self {
        Self {
            status: StatusCode::OK,
            headers,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Finalized, HandlerError> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header(header::CONTENT_TYPE, HeaderValue::from_static(JSON))
            .finish(Body::from(body)))
    }

    /// `{ "message": ... }` with the current status.
    pub fn message(self, message: &str) -> Finalized {
        let body = serde_json::json!({ "message": message }).to_string();
        self.header(header::CONTENT_TYPE, HeaderValue::from_static(JSON))
            .finish(Body::from(body))
    }

    pub fn text(mut self, body: impl Into<String>) -> Finalized {
        self.headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(TEXT));
        self.finish(Body::from(body.into()))
    }

    pub fn empty(self) -> Finalized {
        self.finish(Body::empty())
    }

    /// Resolve with the status and public message of `err`.
    pub fn error(self, err: &ApiError) -> Finalized {
        self.status(err.status()).message(err.public_message())
    }

    fn finish(self, body: Body) -> Finalized {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        Finalized(response)
    }
}

impl Finalized {
    pub fn status(&self) -> StatusCode {
        self.0.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.0.headers()
    }

    pub fn into_inner(self) -> Response<Body> {
        self.0
    }
}
