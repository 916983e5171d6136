//! Liveness endpoints.

use serde_json::json;

use crate::api::AppState;
use crate::http::request::ParsedRequest;
use crate::http::response::ResponseBuilder;
use crate::routing::HandlerResult;

pub const BANNER: &str = "LeoConnect backend is running";

pub async fn banner(_: AppState, _req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    Ok(res.text(BANNER))
}

pub async fn health(_: AppState, _req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    res.json(&json!({ "status": "ok" }))
}
