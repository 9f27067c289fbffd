/// Post handlers - HTTP endpoints for post operations
use super::{body_format, caller, path_id, render, PostRecord};
use crate::error::Result;
use crate::middleware::BearerCredentials;
use crate::services::{PostPayload, UpdateMode};
use crate::validators::decode_body;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};

/// List all posts
pub async fn list_posts(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let posts = state.posts().list(actor.as_ref()).await?;
    Ok(HttpResponse::Ok().json(render::<PostRecord, _>(posts)))
}

/// Create a new post from a JSON or urlencoded body
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let format = body_format(&req);
    let post = state
        .posts()
        .create(actor.as_ref(), || decode_body::<PostPayload>(format, &body))
        .await?;
    Ok(HttpResponse::Created().json(PostRecord::from(post)))
}

/// Get a post by ID
pub async fn get_post(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let post_id = path_id(actor.as_ref(), &post_id)?;
    let post = state.posts().get(actor.as_ref(), post_id).await?;
    Ok(HttpResponse::Ok().json(PostRecord::from(post)))
}

async fn update_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: String,
    mode: UpdateMode,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let post_id = path_id(actor.as_ref(), &post_id)?;
    let format = body_format(&req);
    let post = state
        .posts()
        .update(actor.as_ref(), post_id, mode, || {
            decode_body::<PostPayload>(format, &body)
        })
        .await?;
    Ok(HttpResponse::Ok().json(PostRecord::from(post)))
}

/// Replace a post (PUT)
pub async fn put_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    update_post(req, state, credentials, post_id.into_inner(), UpdateMode::Full, body).await
}

/// Partially update a post (PATCH)
pub async fn patch_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    update_post(req, state, credentials, post_id.into_inner(), UpdateMode::Partial, body).await
}

/// Delete a post and its comments
pub async fn delete_post(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let post_id = path_id(actor.as_ref(), &post_id)?;
    state.posts().delete(actor.as_ref(), post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
