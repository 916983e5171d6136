//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, fallback entry, request span)
//!     → request.rs (adapt native request into ParsedRequest)
//!     → [routing layer matches route, runs gate + handler]
//!     → middleware/ (auth gate)
//!     → response.rs (single-use builder, CORS seeded by cors.rs)
//!     → Send to client
//! ```

pub mod cors;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ParsedRequest, RequestBody};
pub use response::{Finalized, ResponseBuilder};
pub use server::{dispatch, HttpServer, X_REQUEST_ID};
