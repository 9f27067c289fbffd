/// HTTP handlers for the Yatube API
///
/// This module contains handlers for:
/// - Posts: list, create, read, replace, patch and delete
/// - Comments: the same operations nested under `/posts/{post_id}/comments`
/// - Groups: read-only listing and lookup
/// - Auth: username/password exchange for an API token
/// - Health and the root endpoint map
///
/// Handlers resolve the caller, call into `services`, and render the
/// response records defined here. They never touch the store directly.
pub mod auth;
pub mod comments;
pub mod groups;
pub mod health;
pub mod posts;
pub mod root;

pub use auth::obtain_token;
pub use comments::{
    create_comment, delete_comment, get_comment, list_comments, patch_comment, put_comment,
};
pub use groups::{get_group, list_groups, reject_group_write};
pub use health::{liveness, readiness};
pub use posts::{create_post, delete_post, get_post, list_posts, patch_post, put_post};
pub use root::api_root;

use crate::error::{AppError, Result};
use crate::middleware::BearerCredentials;
use crate::models::{Actor, Comment, Group, Post};
use crate::validators::BodyFormat;
use crate::AppState;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Wire shape of a post. `author` is rendered as the username.
#[derive(Debug, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub group: Option<i64>,
}

impl From<Post> for PostRecord {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            text: post.text,
            author: post.author.username,
            pub_date: post.pub_date,
            image: post.image,
            group: post.group_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    pub author: String,
    pub post: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentRecord {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author.username,
            post: comment.post_id,
            text: comment.text,
            created: comment.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<Group> for GroupRecord {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

/// Resolve the request credentials to an optional actor.
pub(crate) async fn caller(
    state: &AppState,
    credentials: &BearerCredentials,
) -> Result<Option<Actor>> {
    state.auth().identify(credentials).await
}

/// Turn a raw path segment into an id once the caller is known. Anonymous
/// callers are rejected before a bad id can surface as 404.
pub(crate) fn path_id(actor: Option<&Actor>, raw: &str) -> Result<i64> {
    if actor.is_none() {
        return Err(AppError::Unauthorized);
    }
    raw.parse().map_err(|_| AppError::NotFound)
}

pub(crate) fn body_format(req: &HttpRequest) -> BodyFormat {
    BodyFormat::from_content_type(req.content_type())
}

pub(crate) fn render<R, T>(items: Vec<T>) -> Vec<R>
where
    R: From<T>,
{
    items.into_iter().map(R::from).collect()
}

/// Fallback for paths under the API scope that match no route.
pub async fn not_found() -> Result<HttpResponse> {
    Err(AppError::NotFound)
}

/// Fallback for methods a resource does not route. Authentication still
/// comes first.
pub async fn method_not_allowed(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
) -> Result<HttpResponse> {
    if caller(&state, &credentials).await?.is_none() {
        return Err(AppError::Unauthorized);
    }
    Err(AppError::MethodNotAllowed)
}
