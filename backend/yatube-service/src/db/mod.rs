/// Storage layer
///
/// This module provides:
/// - `ContentStore`: groups, posts and comments, including the atomic
///   post-with-comments delete
/// - `CredentialStore`: users and API token digests
/// - `MemoryStore` and `PgStore`, both implementing the two traits
///
/// Store methods report absence with `Ok(None)`/`Ok(false)`; deciding whether
/// absence is a 404 belongs to the service layer.
use crate::error::Result;
use crate::models::{
    Actor, Comment, CommentChanges, Group, NewGroup, NewPost, Post, PostChanges, UserLogin,
};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Cheap round trip used by readiness probes.
    async fn ping(&self) -> Result<()>;

    async fn list_groups(&self) -> Result<Vec<Group>>;
    async fn get_group(&self, group_id: i64) -> Result<Option<Group>>;
    /// Out-of-band only; no HTTP route reaches this.
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    /// All posts ordered by id ascending.
    async fn list_posts(&self) -> Result<Vec<Post>>;
    async fn get_post(&self, post_id: i64) -> Result<Option<Post>>;
    /// Fails with `Validation` when `group_id` names no group.
    async fn insert_post(&self, author: &Actor, post: NewPost) -> Result<Post>;
    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;
    /// Removes the post and every comment under it as one atomic unit.
    async fn delete_post_cascade(&self, post_id: i64) -> Result<bool>;

    /// Comments under `post_id` ordered by id ascending.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;
    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>>;
    /// Fails with `NotFound` when the parent post no longer exists.
    async fn insert_comment(&self, author: &Actor, post_id: i64, text: String) -> Result<Comment>;
    async fn update_comment(
        &self,
        comment_id: i64,
        changes: CommentChanges,
    ) -> Result<Option<Comment>>;
    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve a token digest to the user that owns it.
    async fn actor_for_token(&self, digest: &str) -> Result<Option<Actor>>;
    async fn find_login(&self, username: &str) -> Result<Option<UserLogin>>;
    /// Install `digest` as the user's only token, revoking any previous one.
    async fn store_token(&self, user_id: i64, digest: &str) -> Result<()>;
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<Actor>;
}
