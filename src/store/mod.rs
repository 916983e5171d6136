//! Data store subsystem.
//!
//! # Data Flow
//! ```text
//! terminal handler (validated input)
//!     → Store trait (one call per logical operation)
//!     → memory.rs (DashMap tables, seeded clubs)
//!     → records / read models (types.rs)
//! ```
//!
//! # Design Decisions
//! - Handlers only see the `Store` trait; the backend is chosen at startup
//! - Check-and-insert operations are single calls so uniqueness holds under
//!   concurrent requests
//! - Expected outcomes (missing row, duplicate) are distinct error variants so
//!   handlers can map them to 404 / 409

pub mod memory;
pub mod types;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::MemoryStore;
pub use types::{
    Club, ClubView, Comment, CommentView, Event, EventQuery, EventView, FeedItem, NewEvent,
    NewUser, Post, ProfileUpdate, User,
};

/// Error type for store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait Store: Send + Sync + 'static {
    // Users
    fn create_user(&self, user: NewUser) -> StoreResult<User>;
    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    fn user_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    fn update_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<Option<User>>;

    // Posts
    fn create_post(
        &self,
        author_id: &str,
        image_url: Option<String>,
        caption: Option<String>,
    ) -> StoreResult<Post>;
    /// Newest first, strictly older than `before` when given.
    fn feed(&self, before: Option<DateTime<Utc>>, limit: usize) -> StoreResult<Vec<FeedItem>>;
    fn like_post(&self, post_id: &str, user_id: &str) -> StoreResult<()>;
    fn unlike_post(&self, post_id: &str, user_id: &str) -> StoreResult<()>;
    /// Oldest first.
    fn comments(&self, post_id: &str) -> StoreResult<Vec<CommentView>>;
    fn add_comment(&self, post_id: &str, author_id: &str, body: String) -> StoreResult<Comment>;

    // Clubs
    /// Sorted by name.
    fn clubs(&self, district: Option<&str>) -> StoreResult<Vec<ClubView>>;
    fn follow_club(&self, club_id: &str, user_id: &str) -> StoreResult<()>;
    fn unfollow_club(&self, club_id: &str, user_id: &str) -> StoreResult<()>;

    // Events
    /// Ascending by start time.
    fn events(&self, query: &EventQuery) -> StoreResult<Vec<EventView>>;
    fn create_event(&self, event: NewEvent) -> StoreResult<Event>;
    fn rsvp(&self, event_id: &str, user_id: &str) -> StoreResult<()>;
    fn cancel_rsvp(&self, event_id: &str, user_id: &str) -> StoreResult<()>;
}
