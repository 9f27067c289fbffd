/// In-process store backing development runs and the test suite
///
/// All tables sit behind one `RwLock`, so every trait method is a single
/// critical section: readers see a post together with all of its comments, or
/// neither.
use super::{ContentStore, CredentialStore};
use crate::error::{AppError, Result};
use crate::models::{
    Actor, Comment, CommentChanges, Group, NewGroup, NewPost, Post, PostChanges, UserLogin,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserLogin>,
    tokens: HashMap<String, i64>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    sequences: Sequences,
}

#[derive(Default)]
struct Sequences {
    user: i64,
    group: i64,
    post: i64,
    comment: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn get_group(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&group_id).cloned())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group with slug '{}' already exists",
                group.slug
            )));
        }

        let id = next(&mut tables.sequences.group);
        let group = Group {
            id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(id, group.clone());
        Ok(group)
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.tables.read().await.posts.values().cloned().collect())
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn insert_post(&self, author: &Actor, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if let Some(group_id) = post.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(invalid_group(group_id));
            }
        }

        let id = next(&mut tables.sequences.post);
        let post = Post {
            id,
            text: post.text,
            pub_date: Utc::now(),
            author: author.clone(),
            group_id: post.group_id,
            image: post.image,
        };
        tables.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        if let Some(Some(group_id)) = changes.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(invalid_group(group_id));
            }
        }

        let Some(post) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        if let Some(text) = changes.text {
            post.text = text;
        }
        if let Some(group_id) = changes.group_id {
            post.group_id = group_id;
        }
        if let Some(image) = changes.image {
            post.image = image;
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post_cascade(&self, post_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, comment| comment.post_id != post_id);
        Ok(true)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        Ok(self
            .tables
            .read()
            .await
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&comment_id).cloned())
    }

    async fn insert_comment(&self, author: &Actor, post_id: i64, text: String) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        // The post may have been deleted after the scope was resolved.
        if !tables.posts.contains_key(&post_id) {
            return Err(AppError::NotFound);
        }

        let id = next(&mut tables.sequences.comment);
        let comment = Comment {
            id,
            text,
            author: author.clone(),
            post_id,
            created: Utc::now(),
        };
        tables.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        changes: CommentChanges,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.get_mut(&comment_id) else {
            return Ok(None);
        };
        if let Some(text) = changes.text {
            comment.text = text;
        }
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(self.tables.write().await.comments.remove(&comment_id).is_some())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn actor_for_token(&self, digest: &str) -> Result<Option<Actor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(digest)
            .and_then(|user_id| tables.users.get(user_id))
            .map(|login| login.actor.clone()))
    }

    async fn find_login(&self, username: &str) -> Result<Option<UserLogin>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|login| login.actor.username == username)
            .cloned())
    }

    async fn store_token(&self, user_id: i64, digest: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::NotFound);
        }
        // One live token per user.
        tables.tokens.retain(|_, owner| *owner != user_id);
        tables.tokens.insert(digest.to_string(), user_id);
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<Actor> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|login| login.actor.username == username) {
            return Err(AppError::Conflict(format!(
                "user '{}' already exists",
                username
            )));
        }

        let id = next(&mut tables.sequences.user);
        let actor = Actor {
            id,
            username: username.to_string(),
        };
        tables.users.insert(
            id,
            UserLogin {
                actor: actor.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(actor)
    }
}

fn invalid_group(group_id: i64) -> AppError {
    AppError::Validation(format!(
        "group: Invalid pk \"{}\" - object does not exist.",
        group_id
    ))
}
