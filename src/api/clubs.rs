//! Club directory and follows.

use serde_json::json;

use crate::api::{conflict, created, not_found, AppState};
use crate::http::request::ParsedRequest;
use crate::http::response::ResponseBuilder;
use crate::routing::HandlerResult;
use crate::store::StoreError;

pub async fn list(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let district = req.query("district").filter(|d| !d.is_empty());
    let clubs = state.store.clubs(district)?;
    res.json(&json!({ "clubs": clubs }))
}

pub async fn follow(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let user = req.principal()?;
    let club_id = req.param("id").unwrap_or_default();

    match state.store.follow_club(club_id, &user.id) {
        Ok(()) => Ok(created(res, "Following")),
        Err(StoreError::NotFound(_)) => Ok(not_found(res, "Club not found")),
        Err(StoreError::Conflict(_)) => Ok(conflict(res, "Already following")),
        Err(e) => Err(e.into()),
    }
}

pub async fn unfollow(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let user = req.principal()?;
    let club_id = req.param("id").unwrap_or_default();

    state.store.unfollow_club(club_id, &user.id)?;
    Ok(res.message("Unfollowed"))
}
