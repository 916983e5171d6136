//! LeoConnect backend library.
//!
//! A small social-network API (profiles, posts, clubs, events) built around
//! its own request dispatch core: path matching, a single-step gate, and a
//! single-use response builder.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

// Application
pub mod api;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
