/// Group handlers - groups are read-only over HTTP
use super::{caller, path_id, render, GroupRecord};
use crate::error::Result;
use crate::middleware::{Action, BearerCredentials};
use crate::AppState;
use actix_web::{http::Method, web, HttpRequest, HttpResponse};

pub async fn list_groups(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let groups = state.groups().list(actor.as_ref()).await?;
    Ok(HttpResponse::Ok().json(render::<GroupRecord, _>(groups)))
}

pub async fn get_group(
    state: web::Data<AppState>,
    credentials: BearerCredentials,
    group_id: web::Path<String>,
) -> Result<HttpResponse> {
    let actor = caller(&state, &credentials).await?;
    let group_id = path_id(actor.as_ref(), &group_id)?;
    let group = state.groups().get(actor.as_ref(), group_id).await?;
    Ok(HttpResponse::Ok().json(GroupRecord::from(group)))
}

/// Any non-GET method on a group path. The caller is still authenticated
/// first, so anonymous writes get 401 rather than 405.
pub async fn reject_group_write(
    req: HttpRequest,
    state: web::Data<AppState>,
    credentials: BearerCredentials,
) -> Result<HttpResponse> {
    let action = match *req.method() {
        Method::POST => Action::Create,
        Method::DELETE => Action::Delete,
        _ => Action::Update,
    };

    let actor = caller(&state, &credentials).await?;
    state.groups().write(actor.as_ref(), action).await?;
    Ok(HttpResponse::MethodNotAllowed().finish())
}
