/// Post service - handles post creation, retrieval, and management
///
/// Each operation walks the same pipeline: collection gate, load, entity
/// gate, payload validation, store call. The request body is only decoded
/// once the caller is known to be allowed to act.
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{require, Action, ResourceKind, Target};
use crate::models::{Actor, NewPost, Post, PostChanges};
use crate::validators::{clean_text, double_option, nullable_id, required_text};
use serde::Deserialize;
use std::sync::Arc;

const POSTS: Target<'static> = Target::Collection(ResourceKind::Post);

/// Writable post fields. `id`, `author` and `pub_date` are not listed, so any
/// client-supplied values for them are dropped during decoding.
#[derive(Debug, Default, Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub group: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
}

/// PUT replaces, PATCH patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Full,
    Partial,
}

impl UpdateMode {
    pub fn requires_text(self) -> bool {
        self == UpdateMode::Full
    }
}

pub struct PostService {
    store: Arc<dyn ContentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    async fn load(&self, post_id: i64) -> Result<Post> {
        self.store.get_post(post_id).await?.ok_or(AppError::NotFound)
    }

    /// List every post, oldest first
    pub async fn list(&self, actor: Option<&Actor>) -> Result<Vec<Post>> {
        require(actor, Action::List, &POSTS)?;
        self.store.list_posts().await
    }

    /// Get a post by ID
    pub async fn get(&self, actor: Option<&Actor>, post_id: i64) -> Result<Post> {
        require(actor, Action::Read, &POSTS)?;
        let post = self.load(post_id).await?;
        require(actor, Action::Read, &Target::post(&post))?;
        Ok(post)
    }

    /// Create a new post authored by the caller
    pub async fn create<F>(&self, actor: Option<&Actor>, payload: F) -> Result<Post>
    where
        F: FnOnce() -> Result<PostPayload>,
    {
        let author = require(actor, Action::Create, &POSTS)?;
        let payload = payload()?;

        let post = self
            .store
            .insert_post(
                author,
                NewPost {
                    text: required_text(payload.text)?,
                    group_id: payload.group.flatten(),
                    image: payload.image.flatten(),
                },
            )
            .await?;

        tracing::info!(post_id = post.id, user_id = author.id, "post created");
        Ok(post)
    }

    /// Update a post; only its author gets past the entity gate
    pub async fn update<F>(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
        mode: UpdateMode,
        payload: F,
    ) -> Result<Post>
    where
        F: FnOnce() -> Result<PostPayload>,
    {
        require(actor, Action::Update, &POSTS)?;
        let post = self.load(post_id).await?;
        let editor = require(actor, Action::Update, &Target::post(&post))?;
        let payload = payload()?;

        let changes = PostChanges {
            text: clean_text(payload.text, mode.requires_text())?,
            group_id: payload.group,
            image: payload.image,
        };
        let updated = self
            .store
            .update_post(post_id, changes)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(post_id, user_id = editor.id, "post updated");
        Ok(updated)
    }

    /// Delete a post together with all of its comments
    pub async fn delete(&self, actor: Option<&Actor>, post_id: i64) -> Result<()> {
        require(actor, Action::Delete, &POSTS)?;
        let post = self.load(post_id).await?;
        let owner = require(actor, Action::Delete, &Target::post(&post))?;

        if !self.store.delete_post_cascade(post_id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(post_id, user_id = owner.id, "post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CredentialStore, MemoryStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: PostService,
        alice: Actor,
        bob: Actor,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();
        Fixture {
            service: PostService::new(store.clone()),
            store,
            alice,
            bob,
        }
    }

    fn text(value: &str) -> PostPayload {
        PostPayload {
            text: Some(value.to_string()),
            ..PostPayload::default()
        }
    }

    #[tokio::test]
    async fn create_sets_author_from_actor() {
        let f = fixture().await;
        let post = f
            .service
            .create(Some(&f.alice), || Ok(text("Post without group")))
            .await
            .unwrap();

        assert_eq!(post.author, f.alice);
        assert_eq!(post.text, "Post without group");
        assert_eq!(post.group_id, None);
    }

    #[tokio::test]
    async fn anonymous_create_never_decodes_payload() {
        let f = fixture().await;
        let result = f
            .service
            .create(None, || -> Result<PostPayload> {
                panic!("payload must not be decoded before authentication")
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn non_author_update_is_forbidden_and_leaves_post_intact() {
        let f = fixture().await;
        let post = f
            .service
            .create(Some(&f.alice), || Ok(text("original")))
            .await
            .unwrap();

        let result = f
            .service
            .update(Some(&f.bob), post.id, UpdateMode::Partial, || {
                Ok(text("Changed text"))
            })
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        let stored = f.store.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "original");
    }

    #[tokio::test]
    async fn missing_post_is_not_found_even_for_non_owner() {
        let f = fixture().await;
        let result = f
            .service
            .update(Some(&f.bob), 404, UpdateMode::Partial, || Ok(text("x")))
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn full_update_requires_text_partial_does_not() {
        let f = fixture().await;
        let post = f
            .service
            .create(Some(&f.alice), || Ok(text("original")))
            .await
            .unwrap();

        let full = f
            .service
            .update(Some(&f.alice), post.id, UpdateMode::Full, || {
                Ok(PostPayload::default())
            })
            .await;
        assert!(matches!(full, Err(AppError::Validation(_))));

        let partial = f
            .service
            .update(Some(&f.alice), post.id, UpdateMode::Partial, || {
                Ok(PostPayload {
                    image: Some(Some("posts/pic.jpg".into())),
                    ..PostPayload::default()
                })
            })
            .await
            .unwrap();
        assert_eq!(partial.text, "original");
        assert_eq!(partial.image.as_deref(), Some("posts/pic.jpg"));
        assert_eq!(partial.author, f.alice);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let f = fixture().await;
        let result = f
            .service
            .create(Some(&f.alice), || Ok(text("   ")))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(f.store.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_author_cascades() {
        let f = fixture().await;
        let post = f
            .service
            .create(Some(&f.alice), || Ok(text("doomed")))
            .await
            .unwrap();
        let comment = f
            .store
            .insert_comment(&f.bob, post.id, "reply".into())
            .await
            .unwrap();

        assert!(matches!(
            f.service.delete(Some(&f.bob), post.id).await,
            Err(AppError::Forbidden)
        ));
        f.service.delete(Some(&f.alice), post.id).await.unwrap();

        assert!(f.store.get_post(post.id).await.unwrap().is_none());
        assert!(f.store.get_comment(comment.id).await.unwrap().is_none());
    }
}
