//! Events and RSVPs.

use axum::http::StatusCode;
use serde_json::json;

use crate::api::validate::{self, Rejection};
use crate::api::{bad_request, conflict, created, not_found, AppState};
use crate::http::request::{ParsedRequest, RequestBody};
use crate::http::response::ResponseBuilder;
use crate::routing::HandlerResult;
use crate::store::{EventQuery, NewEvent, StoreError};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;
const LOCATION_MAX: usize = 200;

const CLUB_NOT_FOUND: &str = "Club not found";

pub async fn list(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let viewer = req.principal()?;
    let after = match validate::cursor(&req) {
        Ok(after) => after,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };
    let query = EventQuery {
        club_id: req
            .query("clubId")
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        after,
        limit: validate::page_limit(&req),
        viewer: viewer.id.clone(),
    };

    let events = state.store.events(&query)?;
    let next_cursor = if events.len() == query.limit {
        events.last().map(|view| view.event.start_at)
    } else {
        None
    };
    res.json(&json!({ "events": events, "nextCursor": next_cursor }))
}

fn new_event(body: &RequestBody) -> Result<NewEvent, Rejection> {
    let title = validate::text(body, "title")
        .ok()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Rejection::from("title is required"))?;
    validate::max_len(title, "title", TITLE_MAX)?;

    let start_at = validate::non_empty(body, "startAt")
        .ok()
        .flatten()
        .ok_or_else(|| Rejection::from("startAt (ISO 8601 date string) is required"))?;
    let start_at = validate::timestamp(start_at, "startAt")?;

    let end_at = match validate::text(body, "endAt") {
        Ok(None) => None,
        Ok(Some(raw)) => Some(validate::timestamp(raw, "endAt")?),
        Err(_) => return Err("endAt must be a valid ISO 8601 date string".into()),
    };
    if end_at.is_some_and(|end| end < start_at) {
        return Err("endAt must not be before startAt".into());
    }

    let description = validate::non_empty(body, "description")?;
    if let Some(description) = description {
        validate::max_len(description, "description", DESCRIPTION_MAX)?;
    }

    let location_rule = || format!("location must be a string of {LOCATION_MAX} characters or fewer");
    let location = validate::non_empty(body, "location").map_err(|_| location_rule())?;
    if location.is_some_and(|l| l.chars().count() > LOCATION_MAX) {
        return Err(location_rule());
    }

    let club_id = validate::non_empty(body, "clubId")?;

    Ok(NewEvent {
        club_id: club_id.map(str::to_string),
        title: title.trim().to_string(),
        description: description.map(|d| d.trim().to_string()),
        location: location.map(|l| l.trim().to_string()),
        start_at,
        end_at,
    })
}

pub async fn create(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    req.principal()?;
    let event = match new_event(&req.body) {
        Ok(event) => event,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };

    match state.store.create_event(event) {
        Ok(event) => res.status(StatusCode::CREATED).json(&json!({ "event": event })),
        Err(StoreError::NotFound(_)) => Ok(not_found(res, CLUB_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

pub async fn rsvp(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let user = req.principal()?;
    let event_id = req.param("id").unwrap_or_default();

    match state.store.rsvp(event_id, &user.id) {
        Ok(()) => Ok(created(res, "RSVP confirmed")),
        Err(StoreError::NotFound(_)) => Ok(not_found(res, "Event not found")),
        Err(StoreError::Conflict(_)) => Ok(conflict(res, "Already attending")),
        Err(e) => Err(e.into()),
    }
}

pub async fn cancel_rsvp(
    state: AppState,
    req: ParsedRequest,
    res: ResponseBuilder,
) -> HandlerResult {
    let user = req.principal()?;
    let event_id = req.param("id").unwrap_or_default();

    state.store.cancel_rsvp(event_id, &user.id)?;
    Ok(res.message("RSVP cancelled"))
}
