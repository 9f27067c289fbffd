/// Parent-post scoping for nested comment routes
///
/// Every comment operation resolves its `/posts/{post_id}/` prefix into a
/// `PostScope` before anything else touches the store. The scope is the only
/// source of a comment's parent: request bodies never supply it.
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{Comment, Post};

#[derive(Debug, Clone)]
pub struct PostScope {
    post: Post,
}

impl PostScope {
    /// Resolve the parent post named by the path, or fail with `NotFound`.
    pub async fn resolve(store: &dyn ContentStore, post_id: i64) -> Result<Self> {
        store
            .get_post(post_id)
            .await?
            .map(|post| PostScope { post })
            .ok_or(AppError::NotFound)
    }

    pub fn post_id(&self) -> i64 {
        self.post.id
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    /// Accept a comment only if it lives under this post. A mismatch is
    /// reported exactly like a missing comment.
    pub fn admit(&self, comment: Comment) -> Result<Comment> {
        if comment.post_id == self.post.id {
            Ok(comment)
        } else {
            Err(AppError::NotFound)
        }
    }

    /// Load a comment constrained to this scope.
    pub async fn comment(&self, store: &dyn ContentStore, comment_id: i64) -> Result<Comment> {
        let comment = store
            .get_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.admit(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CredentialStore, MemoryStore};
    use crate::models::NewPost;

    #[tokio::test]
    async fn unknown_parent_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            PostScope::resolve(&store, 1).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn comment_from_another_post_is_masked() {
        let store = MemoryStore::new();
        let author = store.create_user("regular_user", "hash").await.unwrap();
        let p1 = store
            .insert_post(&author, NewPost { text: "p1".into(), ..NewPost::default() })
            .await
            .unwrap();
        let p2 = store
            .insert_post(&author, NewPost { text: "p2".into(), ..NewPost::default() })
            .await
            .unwrap();
        let c1 = store.insert_comment(&author, p1.id, "on p1".into()).await.unwrap();
        let c2 = store.insert_comment(&author, p2.id, "on p2".into()).await.unwrap();

        let scope = PostScope::resolve(&store, p1.id).await.unwrap();
        assert_eq!(scope.post_id(), p1.id);
        assert_eq!(scope.comment(&store, c1.id).await.unwrap(), c1);
        assert!(matches!(
            scope.comment(&store, c2.id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            scope.comment(&store, 999).await,
            Err(AppError::NotFound)
        ));
    }
}
