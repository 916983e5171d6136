//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! login handler:
//!     → password.rs (bcrypt verify on the blocking pool)
//!     → token.rs (issue HS256 access token)
//!
//! gated request:
//!     → http::middleware::auth (extract bearer credential)
//!     → token.rs (verify signature, expiry, issuer, type)
//!     → Claims attached to the request
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing secret never falls back to a default
//! - No trust in client input

pub mod password;
pub mod token;
