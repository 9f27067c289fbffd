use actix_web::HttpResponse;
use serde_json::json;

/// Static service metadata, no credentials needed.
pub async fn api_root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to the Yatube API",
        "endpoints": {
            "api-token-auth": "/api/v1/api-token-auth/",
            "posts": "/api/v1/posts/",
            "groups": "/api/v1/groups/",
            "comments": "/api/v1/posts/{post_id}/comments/",
            "health": "/api/v1/health/",
            "metrics": "/metrics"
        }
    }))
}
