//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Answer CORS preflight before any lookup
//! - Match method + path, run the route's gate, then its handler
//! - Turn every handler fault (error or panic) into one generic 500
//!
//! # Design Decisions
//! - Immutable after `build` (thread-safe without locks)
//! - O(n) scan, first match wins; register specific patterns before general ones
//! - Explicit 404 rather than a silent default
//! - This is the only place a fault becomes a status code

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, HandlerError};
use crate::http::cors::Cors;
use crate::http::middleware::{Gate, GateOutcome};
use crate::http::request::ParsedRequest;
use crate::http::response::Finalized;
use crate::routing::handler::Handler;
use crate::routing::matcher::{match_path, MatchResult, Pattern, RouteError};

struct Route<S> {
    method: Method,
    pattern: Pattern,
    gate: Option<Arc<dyn Gate>>,
    handler: Box<dyn Handler<S>>,
}

/// Collects routes before freezing them into a [`Router`].
pub struct RouterBuilder<S> {
    routes: Vec<Route<S>>,
}

impl<S> Default for RouterBuilder<S> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<S: Clone + Send + Sync + 'static> RouterBuilder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open route.
    pub fn route(
        self,
        method: Method,
        pattern: &str,
        handler: impl Handler<S>,
    ) -> Result<Self, RouteError> {
        self.push(method, pattern, None, Box::new(handler))
    }

    /// Register a route whose handler only runs when `gate` lets it through.
    pub fn gated_route(
        self,
        method: Method,
        pattern: &str,
        gate: Arc<dyn Gate>,
        handler: impl Handler<S>,
    ) -> Result<Self, RouteError> {
        self.push(method, pattern, Some(gate), Box::new(handler))
    }

    fn push(
        mut self,
        method: Method,
        pattern: &str,
        gate: Option<Arc<dyn Gate>>,
        handler: Box<dyn Handler<S>>,
    ) -> Result<Self, RouteError> {
        let pattern = Pattern::parse(pattern)?;
        self.routes.push(Route {
            method,
            pattern,
            gate,
            handler,
        });
        Ok(self)
    }

    /// Freeze the table.
    pub fn build(self, state: S) -> Router<S> {
        for (i, later) in self.routes.iter().enumerate() {
            let shadowed_by = self.routes[..i]
                .iter()
                .find(|earlier| {
                    earlier.method == later.method && earlier.pattern.shadows(&later.pattern)
                });
            if let Some(earlier) = shadowed_by {
                warn!(
                    method = %later.method,
                    pattern = later.pattern.as_str(),
                    shadowed_by = earlier.pattern.as_str(),
                    "Route can never match"
                );
            }
        }

        let cors = Cors::for_methods(self.routes.iter().map(|r| &r.method));
        info!(routes = self.routes.len(), "Route table frozen");

        Router {
            routes: self.routes,
            state,
            cors,
        }
    }
}

/// Immutable route table.
pub struct Router<S> {
    routes: Vec<Route<S>>,
    state: S,
    cors: Cors,
}

impl<S: Clone + Send + Sync + 'static> Router<S> {
    pub fn builder() -> RouterBuilder<S> {
        RouterBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Produce exactly one response for `req`.
    pub async fn dispatch(&self, mut req: ParsedRequest) -> Finalized {
        if req.method == Method::OPTIONS {
            return self.cors.seed().status(StatusCode::NO_CONTENT).empty();
        }

        for route in &self.routes {
            if route.method != req.method {
                continue;
            }
            if let MatchResult::Matched(params) = match_path(&route.pattern, &req.path) {
                req.params = params;
                return self.run(route, req).await;
            }
        }

        let err = ApiError::NoRouteMatch {
            method: req.method,
            path: req.path,
        };
        debug!(error = %err, "Dispatch miss");
        self.cors.seed().error(&err)
    }

    async fn run(&self, route: &Route<S>, mut req: ParsedRequest) -> Finalized {
        let mut res = self.cors.seed();

        if let Some(gate) = &route.gate {
            let outcome = catch_unwind(AssertUnwindSafe(|| gate.evaluate(&mut req, res)));
            res = match outcome {
                Ok(Ok(GateOutcome::Continue(res))) => res,
                Ok(Ok(GateOutcome::Terminated(done))) => return done,
                Ok(Err(e)) => return self.fault(route, e),
                Err(payload) => return self.fault(route, panic_to_error(payload)),
            };
        }

        let state = self.state.clone();
        let handler = &route.handler;
        // The call happens inside the guarded future so a panic before the
        // first await is caught as well.
        let outcome = AssertUnwindSafe(async move { handler.call(state, req, res).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => self.fault(route, e),
            Err(payload) => self.fault(route, panic_to_error(payload)),
        }
    }

    fn fault(&self, route: &Route<S>, err: HandlerError) -> Finalized {
        let err = ApiError::HandlerFault(err);
        error!(
            method = %route.method,
            pattern = route.pattern.as_str(),
            error = %err,
            "Request failed"
        );
        self.cors.seed().error(&err)
    }
}

impl<S> std::fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.routes
                    .iter()
                    .map(|r| format!("{} {}", r.method, r.pattern.as_str())),
            )
            .finish()
    }
}

fn panic_to_error(payload: Box<dyn Any + Send>) -> HandlerError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    HandlerError::Panic(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::AuthGate;
    use crate::routing::handler::HandlerResult;
    use crate::security::token::TokenKeys;
    use crate::http::response::ResponseBuilder;
    use axum::http::header;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    type Flag = Arc<AtomicBool>;

    async fn body_json(done: Finalized) -> Value {
        let bytes = axum::body::to_bytes(done.into_inner().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn mark(flag: Flag, _req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
        flag.store(true, Ordering::SeqCst);
        Ok(res.message("ran"))
    }

    async fn echo_params(_: Flag, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
        res.json(&json!({ "route": "comments", "params": req.params }))
    }

    async fn feed(_: Flag, _req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
        res.json(&json!({ "route": "feed" }))
    }

    async fn whoami(_: Flag, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
        let id = req.auth.map(|c| c.id).unwrap_or_default();
        res.json(&json!({ "id": id }))
    }

    async fn fails(_: Flag, _req: ParsedRequest, _res: ResponseBuilder) -> HandlerResult {
        Err(HandlerError::SecretMissing)
    }

    async fn panics(_: Flag, _req: ParsedRequest, _res: ResponseBuilder) -> HandlerResult {
        panic!("boom with secret detail")
    }

    fn keys() -> Arc<TokenKeys> {
        Arc::new(TokenKeys::new("router-secret", "leoconnect", 3600))
    }

    fn table(flag: Flag) -> Router<Flag> {
        let gate: Arc<dyn Gate> = Arc::new(AuthGate::new(Some(keys())));
        Router::builder()
            .route(Method::GET, "/api/posts/:id/comments", echo_params)
            .unwrap()
            .route(Method::GET, "/api/posts", feed)
            .unwrap()
            .gated_route(Method::POST, "/api/posts", gate.clone(), mark)
            .unwrap()
            .gated_route(Method::GET, "/api/me", gate, whoami)
            .unwrap()
            .route(Method::GET, "/fails", fails)
            .unwrap()
            .route(Method::DELETE, "/panics", panics)
            .unwrap()
            .build(flag)
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let router = table(Flag::default());
        let done = router
            .dispatch(ParsedRequest::new(Method::GET, "/nope"))
            .await;
        assert_eq!(done.status(), StatusCode::NOT_FOUND);
        assert!(done
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert_eq!(body_json(done).await, json!({ "message": "Not found" }));
    }

    #[tokio::test]
    async fn test_method_mismatch_is_404() {
        let router = table(Flag::default());
        let done = router
            .dispatch(ParsedRequest::new(Method::PUT, "/api/posts"))
            .await;
        assert_eq!(done.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preflight_skips_gate_and_handler() {
        let flag = Flag::default();
        let router = table(flag.clone());
        let done = router
            .dispatch(ParsedRequest::new(Method::OPTIONS, "/api/posts"))
            .await;

        assert_eq!(done.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            done.headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap(),
            "GET, POST, DELETE, OPTIONS"
        );
        assert!(!flag.load(Ordering::SeqCst));

        let unknown = router
            .dispatch(ParsedRequest::new(Method::OPTIONS, "/not/a/route"))
            .await;
        assert_eq!(unknown.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_gate_termination_skips_handler() {
        let flag = Flag::default();
        let router = table(flag.clone());
        let done = router
            .dispatch(ParsedRequest::new(Method::POST, "/api/posts"))
            .await;

        assert_eq!(done.status(), StatusCode::UNAUTHORIZED);
        assert!(!flag.load(Ordering::SeqCst));
        assert_eq!(
            body_json(done).await,
            json!({ "message": "Access denied. No token provided." })
        );
    }

    #[tokio::test]
    async fn test_gate_continue_runs_handler() {
        let flag = Flag::default();
        let router = table(flag.clone());
        let token = keys().issue("u1").unwrap();
        let done = router
            .dispatch(
                ParsedRequest::new(Method::POST, "/api/posts")
                    .with_header("Authorization", format!("Bearer {token}")),
            )
            .await;

        assert_eq!(done.status(), StatusCode::OK);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_specific_route_wins_by_order() {
        let router = table(Flag::default());

        let done = router
            .dispatch(ParsedRequest::new(Method::GET, "/api/posts/42/comments"))
            .await;
        assert_eq!(
            body_json(done).await,
            json!({ "route": "comments", "params": { "id": "42" } })
        );

        let done = router
            .dispatch(ParsedRequest::new(Method::GET, "/api/posts"))
            .await;
        assert_eq!(body_json(done).await, json!({ "route": "feed" }));
    }

    #[tokio::test]
    async fn test_handler_error_is_generic_500() {
        let router = table(Flag::default());
        let done = router
            .dispatch(ParsedRequest::new(Method::GET, "/fails"))
            .await;
        assert_eq!(done.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(done
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert_eq!(
            body_json(done).await,
            json!({ "message": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_handler_panic_is_generic_500() {
        let router = table(Flag::default());
        let done = router
            .dispatch(ParsedRequest::new(Method::DELETE, "/panics"))
            .await;
        assert_eq!(done.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(done).await,
            json!({ "message": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_see_own_auth() {
        let router = Arc::new(table(Flag::default()));
        let keys = keys();

        let mut tasks = Vec::new();
        for user in ["alice", "bob", "carol", "dave"] {
            let router = router.clone();
            let token = keys.issue(user).unwrap();
            tasks.push(tokio::spawn(async move {
                let done = router
                    .dispatch(
                        ParsedRequest::new(Method::GET, "/api/me")
                            .with_header("Authorization", format!("Bearer {token}")),
                    )
                    .await;
                (user, body_json(done).await)
            }));
        }

        for task in tasks {
            let (user, body) = task.await.unwrap();
            assert_eq!(body, json!({ "id": user }));
        }
    }

    #[test]
    fn test_bad_pattern_rejected_at_registration() {
        let result = Router::<Flag>::builder().route(Method::GET, "no-slash", feed);
        assert!(matches!(result, Err(RouteError::MissingLeadingSlash(_))));
    }

    #[test]
    fn test_panic_payloads() {
        let err = panic_to_error(Box::new("static"));
        assert!(matches!(err, HandlerError::Panic(m) if m == "static"));
        let err = panic_to_error(Box::new(String::from("owned")));
        assert!(matches!(err, HandlerError::Panic(m) if m == "owned"));
        let err = panic_to_error(Box::new(7_u8));
        assert!(matches!(err, HandlerError::Panic(m) if m == "non-string panic payload"));
    }
}
