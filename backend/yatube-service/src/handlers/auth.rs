/// Token exchange endpoint
use crate::error::Result;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchange username and password for an API token. Accepts JSON or a
/// urlencoded form.
pub async fn obtain_token(
    state: web::Data<AppState>,
    req: web::Either<web::Json<TokenRequest>, web::Form<TokenRequest>>,
) -> Result<HttpResponse> {
    let req = match req {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    let token = state
        .auth()
        .obtain_token(&req.username, &req.password)
        .await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}
