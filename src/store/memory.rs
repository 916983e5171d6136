//! In-process store backed by concurrent maps.
//!
//! # Design Decisions
//! - One `DashMap` per table; relation tables are keyed by `(parent, user)`
//!   so uniqueness is enforced by the entry API
//! - Joins are done at read time by id lookup; rows whose parent vanished are
//!   skipped the way an inner join would
//! - A shard guard is never held across a write to the same map

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::ClubSeed;
use crate::store::types::*;
use crate::store::{Store, StoreError, StoreResult};

type Relation = DashMap<(String, String), DateTime<Utc>>;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
    posts: DashMap<String, Post>,
    likes: Relation,
    comments: DashMap<String, Comment>,
    clubs: DashMap<String, Club>,
    follows: Relation,
    events: DashMap<String, Event>,
    rsvps: Relation,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Insert `(parent, user)` unless present.
fn relate(table: &Relation, parent: &str, user: &str, what: &'static str) -> StoreResult<()> {
    match table.entry((parent.to_string(), user.to_string())) {
        Entry::Occupied(_) => Err(StoreError::Conflict(what)),
        Entry::Vacant(slot) => {
            slot.insert(Utc::now());
            Ok(())
        }
    }
}

fn unrelate(table: &Relation, parent: &str, user: &str) {
    table.remove(&(parent.to_string(), user.to_string()));
}

fn count_for(table: &Relation, parent: &str) -> usize {
    table.iter().filter(|entry| entry.key().0 == parent).count()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the configured clubs.
    pub fn seeded(clubs: &[ClubSeed]) -> Self {
        let store = Self::new();
        for seed in clubs {
            store.clubs.insert(
                seed.id.clone(),
                Club {
                    id: seed.id.clone(),
                    name: seed.name.clone(),
                    district: seed.district.clone(),
                    description: seed.description.clone(),
                    avatar_url: seed.avatar_url.clone(),
                },
            );
        }
        tracing::debug!(clubs = store.clubs.len(), "Seeded memory store");
        store
    }

    fn author(&self, id: &str) -> Option<(String, Option<String>)> {
        self.users
            .get(id)
            .map(|user| (user.username.clone(), user.avatar_url.clone()))
    }
}

impl Store for MemoryStore {
    fn create_user(&self, new: NewUser) -> StoreResult<User> {
        match self.emails.entry(new.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("user")),
            Entry::Vacant(slot) => {
                let user = User {
                    id: new_id(),
                    username: new.username,
                    email: new.email,
                    password_hash: new.password_hash,
                    leo_id: new.leo_id,
                    leo_district: new.leo_district,
                    club_name: new.club_name,
                    about: new.about,
                    avatar_url: None,
                    created_at: Utc::now(),
                };
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = self.emails.get(email).map(|id| id.clone());
        Ok(id.and_then(|id| self.users.get(&id).map(|user| user.clone())))
    }

    fn user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).map(|user| user.clone()))
    }

    fn update_profile(&self, id: &str, update: ProfileUpdate) -> StoreResult<Option<User>> {
        Ok(self.users.get_mut(id).map(|mut user| {
            user.username = update.username;
            user.about = update.about;
            user.avatar_url = update.avatar_url;
            user.clone()
        }))
    }

    fn create_post(
        &self,
        author_id: &str,
        image_url: Option<String>,
        caption: Option<String>,
    ) -> StoreResult<Post> {
        let post = Post {
            id: new_id(),
            author_id: author_id.to_string(),
            image_url,
            caption,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    fn feed(&self, before: Option<DateTime<Utc>>, limit: usize) -> StoreResult<Vec<FeedItem>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|post| before.map_or(true, |cursor| post.created_at < cursor))
            .map(|post| post.clone())
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let items = posts
            .into_iter()
            .filter_map(|post| {
                let (username, avatar_url) = self.author(&post.author_id)?;
                let like_count = count_for(&self.likes, &post.id);
                let comment_count = self
                    .comments
                    .iter()
                    .filter(|c| c.post_id == post.id)
                    .count();
                Some(FeedItem {
                    post,
                    username,
                    avatar_url,
                    like_count,
                    comment_count,
                })
            })
            .take(limit)
            .collect();
        Ok(items)
    }

    fn like_post(&self, post_id: &str, user_id: &str) -> StoreResult<()> {
        if !self.posts.contains_key(post_id) {
            return Err(StoreError::NotFound("post"));
        }
        relate(&self.likes, post_id, user_id, "like")
    }

    fn unlike_post(&self, post_id: &str, user_id: &str) -> StoreResult<()> {
        unrelate(&self.likes, post_id, user_id);
        Ok(())
    }

    fn comments(&self, post_id: &str) -> StoreResult<Vec<CommentView>> {
        if !self.posts.contains_key(post_id) {
            return Err(StoreError::NotFound("post"));
        }
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.clone())
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(comments
            .into_iter()
            .filter_map(|c| {
                let (username, avatar_url) = self.author(&c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    body: c.body,
                    created_at: c.created_at,
                    username,
                    avatar_url,
                })
            })
            .collect())
    }

    fn add_comment(&self, post_id: &str, author_id: &str, body: String) -> StoreResult<Comment> {
        if !self.posts.contains_key(post_id) {
            return Err(StoreError::NotFound("post"));
        }
        let comment = Comment {
            id: new_id(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            body,
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    fn clubs(&self, district: Option<&str>) -> StoreResult<Vec<ClubView>> {
        let mut clubs: Vec<Club> = self
            .clubs
            .iter()
            .filter(|club| district.map_or(true, |d| club.district == d))
            .map(|club| club.clone())
            .collect();
        clubs.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(clubs
            .into_iter()
            .map(|club| {
                let follower_count = count_for(&self.follows, &club.id);
                ClubView {
                    club,
                    follower_count,
                }
            })
            .collect())
    }

    fn follow_club(&self, club_id: &str, user_id: &str) -> StoreResult<()> {
        if !self.clubs.contains_key(club_id) {
            return Err(StoreError::NotFound("club"));
        }
        relate(&self.follows, club_id, user_id, "follow")
    }

    fn unfollow_club(&self, club_id: &str, user_id: &str) -> StoreResult<()> {
        unrelate(&self.follows, club_id, user_id);
        Ok(())
    }

    fn events(&self, query: &EventQuery) -> StoreResult<Vec<EventView>> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| {
                query
                    .club_id
                    .as_deref()
                    .map_or(true, |club| e.club_id.as_deref() == Some(club))
            })
            .filter(|e| query.after.map_or(true, |after| e.start_at > after))
            .map(|e| e.clone())
            .collect();
        events.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        events.truncate(query.limit);

        Ok(events
            .into_iter()
            .map(|event| {
                let club_name = event
                    .club_id
                    .as_deref()
                    .and_then(|id| self.clubs.get(id).map(|club| club.name.clone()));
                let attendee_count = count_for(&self.rsvps, &event.id);
                let is_attending = self
                    .rsvps
                    .contains_key(&(event.id.clone(), query.viewer.clone()));
                EventView {
                    event,
                    club_name,
                    attendee_count,
                    is_attending,
                }
            })
            .collect())
    }

    fn create_event(&self, new: NewEvent) -> StoreResult<Event> {
        if let Some(club_id) = new.club_id.as_deref() {
            if !self.clubs.contains_key(club_id) {
                return Err(StoreError::NotFound("club"));
            }
        }
        let event = Event {
            id: new_id(),
            club_id: new.club_id,
            title: new.title,
            description: new.description,
            location: new.location,
            start_at: new.start_at,
            end_at: new.end_at,
            created_at: Utc::now(),
        };
        self.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    fn rsvp(&self, event_id: &str, user_id: &str) -> StoreResult<()> {
        if !self.events.contains_key(event_id) {
            return Err(StoreError::NotFound("event"));
        }
        relate(&self.rsvps, event_id, user_id, "rsvp")
    }

    fn cancel_rsvp(&self, event_id: &str, user_id: &str) -> StoreResult<()> {
        unrelate(&self.rsvps, event_id, user_id);
        Ok(())
    }
}
