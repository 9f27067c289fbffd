/// Data models for yatube-service
///
/// This module defines structures for:
/// - Actor: an authenticated user identity
/// - Group: read-only topical collections posts may belong to
/// - Post: user-authored text entries with an optional group and image
/// - Comment: user-authored replies scoped under exactly one post
///
/// Wire formats live next to the handlers; these are storage-facing shapes.
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Authenticated user identity making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub username: String,
}

/// Stored login material for the token exchange.
#[derive(Debug, Clone)]
pub struct UserLogin {
    pub actor: Actor,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Group definition used by out-of-band seeding.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: Actor,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Field changes for a post. The outer `Option` means "leave unchanged",
/// the inner one distinguishes a value from an explicit null.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: Option<String>,
    pub group_id: Option<Option<i64>>,
    pub image: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author: Actor,
    pub post_id: i64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub text: Option<String>,
}

/// Resources with a single owning author.
pub trait Authored {
    fn author(&self) -> &Actor;
}

impl Authored for Post {
    fn author(&self) -> &Actor {
        &self.author
    }
}

impl Authored for Comment {
    fn author(&self) -> &Actor {
        &self.author
    }
}
