//! Feed, posts, likes and comments.

use axum::http::StatusCode;
use serde_json::json;

use crate::api::validate::{self, Rejection};
use crate::api::{bad_request, conflict, created, not_found, AppState};
use crate::http::request::{ParsedRequest, RequestBody};
use crate::http::response::ResponseBuilder;
use crate::routing::HandlerResult;
use crate::store::StoreError;

const CAPTION_MAX: usize = 2200;
const IMAGE_URL_MAX: usize = 2048;
const COMMENT_MAX: usize = 1000;

const POST_NOT_FOUND: &str = "Post not found";

pub async fn feed(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let limit = validate::page_limit(&req);
    let before = match validate::cursor(&req) {
        Ok(before) => before,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };

    let posts = state.store.feed(before, limit)?;
    let next_cursor = if posts.len() == limit {
        posts.last().map(|item| item.post.created_at)
    } else {
        None
    };
    res.json(&json!({ "posts": posts, "nextCursor": next_cursor }))
}

fn new_post(body: &RequestBody) -> Result<(Option<String>, Option<String>), Rejection> {
    let image_url = validate::non_empty(body, "imageUrl")?;
    let caption = validate::non_empty(body, "caption")?;

    if image_url.is_none() && caption.is_none() {
        return Err("A post must have an image or caption".into());
    }
    if let Some(url) = image_url {
        validate::https_url(url, "imageUrl")?;
        validate::max_len(url, "imageUrl", IMAGE_URL_MAX)?;
    }
    if let Some(caption) = caption {
        validate::max_len(caption, "Caption", CAPTION_MAX)?;
    }

    Ok((
        image_url.map(str::to_string),
        caption.map(|c| c.trim().to_string()),
    ))
}

pub async fn create(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let author = req.principal()?;
    let (image_url, caption) = match new_post(&req.body) {
        Ok(fields) => fields,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };

    let post = state.store.create_post(&author.id, image_url, caption)?;
    tracing::debug!(post_id = %post.id, author = %author.id, "Post created");
    res.status(StatusCode::CREATED).json(&json!({ "post": post }))
}

pub async fn like(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let user = req.principal()?;
    let post_id = req.param("id").unwrap_or_default();

    match state.store.like_post(post_id, &user.id) {
        Ok(()) => Ok(created(res, "Liked")),
        Err(StoreError::NotFound(_)) => Ok(not_found(res, POST_NOT_FOUND)),
        Err(StoreError::Conflict(_)) => Ok(conflict(res, "Already liked")),
        Err(e) => Err(e.into()),
    }
}

pub async fn unlike(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let user = req.principal()?;
    let post_id = req.param("id").unwrap_or_default();

    state.store.unlike_post(post_id, &user.id)?;
    Ok(res.message("Unliked"))
}

pub async fn comments(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let post_id = req.param("id").unwrap_or_default();

    match state.store.comments(post_id) {
        Ok(comments) => res.json(&json!({ "comments": comments })),
        Err(StoreError::NotFound(_)) => Ok(not_found(res, POST_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

fn comment_body(body: &RequestBody) -> Result<String, Rejection> {
    let text = validate::text(body, "body")
        .ok()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Rejection::from("Comment body is required"))?;
    validate::max_len(text, "Comment", COMMENT_MAX)?;
    Ok(text.trim().to_string())
}

pub async fn add_comment(
    state: AppState,
    req: ParsedRequest,
    res: ResponseBuilder,
) -> HandlerResult {
    let author = req.principal()?;
    let post_id = req.param("id").unwrap_or_default();
    let body = match comment_body(&req.body) {
        Ok(body) => body,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };

    match state.store.add_comment(post_id, &author.id, body) {
        Ok(comment) => res.status(StatusCode::CREATED).json(&json!({ "comment": comment })),
        Err(StoreError::NotFound(_)) => Ok(not_found(res, POST_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}
