/// Comment service - comments nested under a parent post
///
/// Every operation resolves the parent `PostScope` first. Ownership is judged
/// on the comment's own author, never on the post author.
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{require, Action, ResourceKind, Target};
use crate::models::{Actor, Comment, CommentChanges};
use crate::services::posts::UpdateMode;
use crate::services::scope::PostScope;
use crate::validators::{clean_text, required_text};
use serde::Deserialize;
use std::sync::Arc;

const COMMENTS: Target<'static> = Target::Collection(ResourceKind::Comment);

/// Writable comment fields. `post` and `author` come from the path and the
/// caller respectively and are dropped if present in the body.
#[derive(Debug, Default, Deserialize)]
pub struct CommentPayload {
    #[serde(default)]
    pub text: Option<String>,
}

pub struct CommentService {
    store: Arc<dyn ContentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    async fn scope(&self, post_id: i64) -> Result<PostScope> {
        PostScope::resolve(self.store.as_ref(), post_id).await
    }

    /// Get comments for a post
    pub async fn list(&self, actor: Option<&Actor>, post_id: i64) -> Result<Vec<Comment>> {
        require(actor, Action::List, &COMMENTS)?;
        let scope = self.scope(post_id).await?;
        self.store.list_comments(scope.post_id()).await
    }

    /// Get a single comment within its post
    pub async fn get(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Comment> {
        require(actor, Action::Read, &COMMENTS)?;
        let scope = self.scope(post_id).await?;
        let comment = scope.comment(self.store.as_ref(), comment_id).await?;
        require(actor, Action::Read, &Target::comment(&comment))?;
        Ok(comment)
    }

    /// Create a new comment under the scoped post
    pub async fn create<F>(&self, actor: Option<&Actor>, post_id: i64, payload: F) -> Result<Comment>
    where
        F: FnOnce() -> Result<CommentPayload>,
    {
        let author = require(actor, Action::Create, &COMMENTS)?;
        let scope = self.scope(post_id).await?;
        let payload = payload()?;

        let comment = self
            .store
            .insert_comment(author, scope.post_id(), required_text(payload.text)?)
            .await?;

        tracing::info!(
            comment_id = comment.id,
            post_id = scope.post_id(),
            user_id = author.id,
            "comment created"
        );
        Ok(comment)
    }

    /// Update a comment; only its author gets past the entity gate
    pub async fn update<F>(
        &self,
        actor: Option<&Actor>,
        post_id: i64,
        comment_id: i64,
        mode: UpdateMode,
        payload: F,
    ) -> Result<Comment>
    where
        F: FnOnce() -> Result<CommentPayload>,
    {
        require(actor, Action::Update, &COMMENTS)?;
        let scope = self.scope(post_id).await?;
        let comment = scope.comment(self.store.as_ref(), comment_id).await?;
        let editor = require(actor, Action::Update, &Target::comment(&comment))?;
        let payload = payload()?;

        let changes = CommentChanges {
            text: clean_text(payload.text, mode.requires_text())?,
        };
        let updated = self
            .store
            .update_comment(comment_id, changes)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(comment_id, post_id, user_id = editor.id, "comment updated");
        Ok(updated)
    }

    /// Delete a comment
    pub async fn delete(&self, actor: Option<&Actor>, post_id: i64, comment_id: i64) -> Result<()> {
        require(actor, Action::Delete, &COMMENTS)?;
        let scope = self.scope(post_id).await?;
        let comment = scope.comment(self.store.as_ref(), comment_id).await?;
        let owner = require(actor, Action::Delete, &Target::comment(&comment))?;

        if !self.store.delete_comment(comment_id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(comment_id, post_id, user_id = owner.id, "comment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CredentialStore, MemoryStore};
    use crate::models::{NewPost, Post};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: CommentService,
        alice: Actor,
        bob: Actor,
        post: Post,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice", "hash").await.unwrap();
        let bob = store.create_user("bob", "hash").await.unwrap();
        let post = store
            .insert_post(
                &alice,
                NewPost {
                    text: "Post with group".into(),
                    ..NewPost::default()
                },
            )
            .await
            .unwrap();
        Fixture {
            service: CommentService::new(store.clone()),
            store,
            alice,
            bob,
            post,
        }
    }

    fn text(value: &str) -> CommentPayload {
        CommentPayload {
            text: Some(value.to_string()),
        }
    }

    #[tokio::test]
    async fn create_binds_author_and_post_from_context() {
        let f = fixture().await;
        let comment = f
            .service
            .create(Some(&f.bob), f.post.id, || Ok(text("hi")))
            .await
            .unwrap();

        assert_eq!(comment.author, f.bob);
        assert_eq!(comment.post_id, f.post.id);
    }

    #[tokio::test]
    async fn unknown_parent_post_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.service.list(Some(&f.alice), 999).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            f.service.create(Some(&f.alice), 999, || Ok(text("hi"))).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn anonymous_is_rejected_before_scope_resolution() {
        let f = fixture().await;
        assert!(matches!(
            f.service.delete(None, 999, 1).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn post_author_cannot_edit_someone_elses_comment() {
        let f = fixture().await;
        let comment = f
            .service
            .create(Some(&f.bob), f.post.id, || Ok(text("bob's")))
            .await
            .unwrap();

        let result = f
            .service
            .update(Some(&f.alice), f.post.id, comment.id, UpdateMode::Partial, || {
                Ok(text("Hacked comment text"))
            })
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        let stored = f.store.get_comment(comment.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "bob's");
    }

    #[tokio::test]
    async fn list_only_returns_scoped_comments() {
        let f = fixture().await;
        let other = f
            .store
            .insert_post(
                &f.bob,
                NewPost {
                    text: "other".into(),
                    ..NewPost::default()
                },
            )
            .await
            .unwrap();
        f.service
            .create(Some(&f.alice), f.post.id, || Ok(text("mine")))
            .await
            .unwrap();
        f.service
            .create(Some(&f.alice), other.id, || Ok(text("elsewhere")))
            .await
            .unwrap();

        let listed = f.service.list(Some(&f.bob), f.post.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "mine");
    }

    #[tokio::test]
    async fn author_can_delete_own_comment() {
        let f = fixture().await;
        let comment = f
            .service
            .create(Some(&f.bob), f.post.id, || Ok(text("temporary")))
            .await
            .unwrap();

        f.service
            .delete(Some(&f.bob), f.post.id, comment.id)
            .await
            .unwrap();
        assert!(matches!(
            f.service.get(Some(&f.bob), f.post.id, comment.id).await,
            Err(AppError::NotFound)
        ));
    }
}
