//! Records and read models.
//!
//! Field names serialize in camelCase to match the wire format.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub leo_id: Option<String>,
    pub leo_district: String,
    pub club_name: String,
    pub about: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration input, already validated and normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub leo_id: Option<String>,
    pub leo_district: String,
    pub club_name: String,
    pub about: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub about: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A post as shown in the feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
    pub avatar_url: Option<String>,
    pub like_count: usize,
    pub comment_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: String,
    pub name: String,
    pub district: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubView {
    #[serde(flatten)]
    pub club: Club,
    pub follower_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub club_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub club_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub club_name: Option<String>,
    pub attendee_count: usize,
    pub is_attending: bool,
}

/// Filter for the event listing.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub club_id: Option<String>,
    /// Only events starting strictly after this instant.
    pub after: Option<DateTime<Utc>>,
    pub limit: usize,
    /// Used for `isAttending`.
    pub viewer: String,
}
