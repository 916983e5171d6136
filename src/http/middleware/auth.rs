//! Bearer-token gate.
//!
//! # Responsibilities
//! - Extract `Authorization: Bearer <token>`
//! - Verify signature, expiry, issuer and token type
//! - Attach the claims to the request for the handler
//!
//! # Design Decisions
//! - A missing signing secret fails closed with a 500; there is no fallback key
//! - Missing and malformed headers are the same 401

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{ApiError, HandlerError};
use crate::http::middleware::{Gate, GateOutcome};
use crate::http::request::ParsedRequest;
use crate::http::response::ResponseBuilder;
use crate::security::token::TokenKeys;

const BEARER: &str = "Bearer ";

#[derive(Clone)]
pub struct AuthGate {
    keys: Option<Arc<TokenKeys>>,
}

impl AuthGate {
    pub fn new(keys: Option<Arc<TokenKeys>>) -> Self {
        Self { keys }
    }
}

/// The token part of a bearer header, if well formed.
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix(BEARER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl Gate for AuthGate {
    fn evaluate(
        &self,
        req: &mut ParsedRequest,
        res: ResponseBuilder,
    ) -> Result<GateOutcome, HandlerError> {
        let Some(token) = req.header("authorization").and_then(bearer_token) else {
            return Ok(GateOutcome::Terminated(res.error(&ApiError::AuthMissing)));
        };

        let Some(keys) = self.keys.as_deref() else {
            error!(path = %req.path, "JWT secret is not configured, rejecting authenticated route");
            return Ok(GateOutcome::Terminated(
                res.error(&ApiError::AuthMisconfigured),
            ));
        };

        match keys.verify(token) {
            Ok(claims) => {
                req.auth = Some(claims);
                Ok(GateOutcome::Continue(res))
            }
            Err(e) => {
                debug!(error = %e, path = %req.path, "Token rejected");
                Ok(GateOutcome::Terminated(
                    res.error(&ApiError::AuthInvalid(e)),
                ))
            }
        }
    }
}
