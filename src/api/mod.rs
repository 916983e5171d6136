//! REST API: state, route table and terminal handlers.
//!
//! # Data Flow
//! ```text
//! Router (matched route, gate passed)
//!     → handler (auth.rs / posts.rs / clubs.rs / events.rs / health.rs)
//!     → validate.rs (400 on bad input)
//!     → Store (404 / 409 as ordinary responses, other faults propagate)
//!     → ResponseBuilder finalized
//! ```
//!
//! # Design Decisions
//! - Specific patterns are registered before general ones sharing a prefix
//! - Every `/api` route except register and login sits behind the auth gate

pub mod auth;
pub mod clubs;
pub mod events;
pub mod health;
pub mod posts;
pub mod validate;

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::config::AppConfig;
use crate::http::middleware::{AuthGate, Gate};
use crate::http::response::{Finalized, ResponseBuilder};
use crate::routing::{RouteError, Router};
use crate::security::token::TokenKeys;
use crate::store::{MemoryStore, Store};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// `None` when no signing secret is configured.
    pub tokens: Option<Arc<TokenKeys>>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: Option<Arc<TokenKeys>>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// State backed by a freshly seeded memory store.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(MemoryStore::seeded(&config.seed.clubs));
        let tokens = TokenKeys::from_config(&config.auth).map(Arc::new);
        Self::new(store, tokens, config.auth.bcrypt_cost)
    }
}

/// Build the frozen route table.
pub fn routes(state: AppState) -> Result<Router<AppState>, RouteError> {
    let gate: Arc<dyn Gate> = Arc::new(AuthGate::new(state.tokens.clone()));

    let router = Router::builder()
        .route(Method::GET, "/", health::banner)?
        .route(Method::GET, "/health", health::health)?
        // auth
        .route(Method::POST, "/api/auth/register", auth::register)?
        .route(Method::POST, "/api/auth/login", auth::login)?
        .gated_route(Method::GET, "/api/auth/profile", gate.clone(), auth::profile)?
        .gated_route(Method::PUT, "/api/auth/profile", gate.clone(), auth::update_profile)?
        // posts
        .gated_route(Method::POST, "/api/posts/:id/like", gate.clone(), posts::like)?
        .gated_route(Method::DELETE, "/api/posts/:id/like", gate.clone(), posts::unlike)?
        .gated_route(Method::GET, "/api/posts/:id/comments", gate.clone(), posts::comments)?
        .gated_route(Method::POST, "/api/posts/:id/comments", gate.clone(), posts::add_comment)?
        .gated_route(Method::GET, "/api/posts", gate.clone(), posts::feed)?
        .gated_route(Method::POST, "/api/posts", gate.clone(), posts::create)?
        // clubs
        .gated_route(Method::POST, "/api/clubs/:id/follow", gate.clone(), clubs::follow)?
        .gated_route(Method::DELETE, "/api/clubs/:id/follow", gate.clone(), clubs::unfollow)?
        .gated_route(Method::GET, "/api/clubs", gate.clone(), clubs::list)?
        // events
        .gated_route(Method::POST, "/api/events/:id/rsvp", gate.clone(), events::rsvp)?
        .gated_route(Method::DELETE, "/api/events/:id/rsvp", gate.clone(), events::cancel_rsvp)?
        .gated_route(Method::GET, "/api/events", gate.clone(), events::list)?
        .gated_route(Method::POST, "/api/events", gate, events::create)?
        .build(state);

    Ok(router)
}

pub(crate) fn bad_request(res: ResponseBuilder, message: &str) -> Finalized {
    res.status(StatusCode::BAD_REQUEST).message(message)
}

pub(crate) fn not_found(res: ResponseBuilder, message: &str) -> Finalized {
    res.status(StatusCode::NOT_FOUND).message(message)
}

pub(crate) fn conflict(res: ResponseBuilder, message: &str) -> Finalized {
    res.status(StatusCode::CONFLICT).message(message)
}

pub(crate) fn created(res: ResponseBuilder, message: &str) -> Finalized {
    res.status(StatusCode::CREATED).message(message)
}
