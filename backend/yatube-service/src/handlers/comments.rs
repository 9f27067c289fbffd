/// Comment handlers - HTTP endpoints nested under a post
use super::{body_format, caller, path_id, render, CommentRecord};
use crate::error::Result;
use crate::middleware::BearerCredentials;
use crate::services::{CommentPayload, UpdateMode};
use crate::validators::decode_body;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};

/// Get comments for a post
pub async fn list_comments(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let post_id = path_id(actor.as_ref(), &post_id)?;
    let comments = state.comments().list(actor.as_ref(), post_id).await?;
    Ok(HttpResponse::Ok().json(render::<CommentRecord, _>(comments)))
}

/// Create a comment under the post in the path
pub async fn create_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let post_id = path_id(actor.as_ref(), &post_id)?;
    let format = body_format(&req);
    let comment = state
        .comments()
        .create(actor.as_ref(), post_id, || {
            decode_body::<CommentPayload>(format, &body)
        })
        .await?;
    Ok(HttpResponse::Created().json(CommentRecord::from(comment)))
}

pub async fn get_comment(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let (post_id, comment_id) = path.into_inner();
    let post_id = path_id(actor.as_ref(), &post_id)?;
    let comment_id = path_id(actor.as_ref(), &comment_id)?;
    let comment = state
        .comments()
        .get(actor.as_ref(), post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(CommentRecord::from(comment)))
}

async fn update_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    path: (String, String),
    mode: UpdateMode,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let post_id = path_id(actor.as_ref(), &path.0)?;
    let comment_id = path_id(actor.as_ref(), &path.1)?;
    let format = body_format(&req);
    let comment = state
        .comments()
        .update(actor.as_ref(), post_id, comment_id, mode, || {
            decode_body::<CommentPayload>(format, &body)
        })
        .await?;
    Ok(HttpResponse::Ok().json(CommentRecord::from(comment)))
}

pub async fn put_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    update_comment(req, state, credentials, path.into_inner(), UpdateMode::Full, body).await
}

pub async fn patch_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    update_comment(req, state, credentials, path.into_inner(), UpdateMode::Partial, body).await
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let (post_id, comment_id) = path.into_inner();
    let post_id = path_id(actor.as_ref(), &post_id)?;
    let comment_id = path_id(actor.as_ref(), &comment_id)?;
    state
        .comments()
        .delete(actor.as_ref(), post_id, comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
