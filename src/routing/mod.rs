//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     (method, pattern, gate?, handler)[]
//!     → matcher.rs (compile patterns)
//!     → router.rs (freeze as immutable Router, compute CORS)
//!
//! Incoming Request (ParsedRequest):
//!     → router.rs (preflight, ordered lookup)
//!     → matcher.rs (segment-wise match, bind params)
//!     → gate → handler.rs (terminal handler)
//!     → Finalized response
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{Handler, HandlerResult};
pub use matcher::{match_path, MatchResult, Pattern, RouteError, RouteParams};
pub use router::{Router, RouterBuilder};
