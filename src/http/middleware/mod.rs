//! Per-route gates.
//!
//! # Data Flow
//! ```text
//! router matched a gated route
//!     → Gate::evaluate(request, builder)
//!         → Continue(builder)   handler runs with the same builder
//!         → Terminated(resp)    handler never runs
//!         → Err(fault)          router answers 500
//! ```
//!
//! # Design Decisions
//! - A gate owns the builder while it runs; handing it back is the only way
//!   to let the handler proceed, so "continue and also respond" is unrepresentable
//! - Gates may enrich the request (e.g. attach the authenticated principal)

pub mod auth;

use crate::error::HandlerError;
use crate::http::request::ParsedRequest;
use crate::http::response::{Finalized, ResponseBuilder};

pub use auth::AuthGate;

/// Result of running a gate.
#[derive(Debug)]
pub enum GateOutcome {
    Continue(ResponseBuilder),
    Terminated(Finalized),
}

/// Precondition checked before a terminal handler.
pub trait Gate: Send + Sync + 'static {
    fn evaluate(
        &self,
        req: &mut ParsedRequest,
        res: ResponseBuilder,
    ) -> Result<GateOutcome, HandlerError>;
}
