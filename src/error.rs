//! Error taxonomy for the dispatch core.
//!
//! # Design Decisions
//! - Only the router and gates translate a fault into an HTTP status
//! - Handlers propagate `HandlerError` with `?` and never format it themselves
//! - The client only ever sees `public_message()`; `Display` output goes to logs

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::security::token::TokenError;
use crate::store::StoreError;

/// A fault raised by a gate or terminal handler.
///
/// Every variant surfaces to the client as the same generic 500.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("JWT secret is not configured")]
    SecretMissing,

    #[error("route reached the handler without an auth context")]
    Unauthenticated,

    #[error("handler panicked: {0}")]
    Panic(String),
}

/// Request-level failures, each mapped to exactly one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no route matched {method} {path}")]
    NoRouteMatch { method: Method, path: String },

    #[error("missing bearer credential")]
    AuthMissing,

    #[error("invalid credential: {0}")]
    AuthInvalid(#[from] TokenError),

    #[error("JWT secret is not configured")]
    AuthMisconfigured,

    #[error("handler fault: {0}")]
    HandlerFault(#[from] HandlerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            ApiError::AuthMissing | ApiError::AuthInvalid(_) => StatusCode::UNAUTHORIZED,
            ApiError::AuthMisconfigured | ApiError::HandlerFault(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the `{ "message": ... }` body.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::NoRouteMatch { .. } => "Not found",
            ApiError::AuthMissing => "Access denied. No token provided.",
            ApiError::AuthInvalid(_) => "Invalid token",
            ApiError::AuthMisconfigured | ApiError::HandlerFault(_) => "Internal server error",
        }
    }
}
