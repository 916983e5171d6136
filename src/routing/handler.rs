//! Terminal handler contract.

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::HandlerError;
use crate::http::request::ParsedRequest;
use crate::http::response::{Finalized, ResponseBuilder};

/// What a terminal handler resolves to. `Err` is reported as a 500 by the router.
pub type HandlerResult = Result<Finalized, HandlerError>;

/// A terminal handler: shared state, the parsed request, and the builder it
/// must finalize.
///
/// Implemented for every `async fn(S, ParsedRequest, ResponseBuilder) -> HandlerResult`.
pub trait Handler<S>: Send + Sync + 'static {
    fn call(&self, state: S, req: ParsedRequest, res: ResponseBuilder)
        -> BoxFuture<'static, HandlerResult>;
}

impl<S, F, Fut> Handler<S> for F
where
    F: Fn(S, ParsedRequest, ResponseBuilder) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(
        &self,
        state: S,
        req: ParsedRequest,
        res: ResponseBuilder,
    ) -> BoxFuture<'static, HandlerResult> {
        (self)(state, req, res).boxed()
    }
}
