/// Route table for the HTTP surface
///
/// Id segments are matched as plain strings and parsed by the handlers after
/// authentication, so an anonymous `/posts/abc/` is 401 like any other
/// protected path. Trailing slashes are removed by `NormalizePath::trim`
/// before matching, which the app builder must install.
use crate::error::AppError;
use crate::handlers;
use crate::metrics;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Malformed request body: {}", err)).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Malformed request body: {}", err)).into()
    }))
    .route("/", web::get().to(handlers::api_root))
    .route("/metrics", web::get().to(metrics::serve_metrics))
    .service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::liveness))
            .route("/health/live", web::get().to(handlers::liveness))
            .route("/health/ready", web::get().to(handlers::readiness))
            .route("/api-token-auth", web::post().to(handlers::obtain_token))
            .service(
                web::resource("/posts")
                    .route(web::get().to(handlers::list_posts))
                    .route(web::post().to(handlers::create_post))
                    .default_service(web::to(handlers::method_not_allowed)),
            )
            .service(
                web::resource("/posts/{post_id}")
                    .route(web::get().to(handlers::get_post))
                    .route(web::put().to(handlers::put_post))
                    .route(web::patch().to(handlers::patch_post))
                    .route(web::delete().to(handlers::delete_post))
                    .default_service(web::to(handlers::method_not_allowed)),
            )
            .service(
                web::resource("/posts/{post_id}/comments")
                    .route(web::get().to(handlers::list_comments))
                    .route(web::post().to(handlers::create_comment))
                    .default_service(web::to(handlers::method_not_allowed)),
            )
            .service(
                web::resource("/posts/{post_id}/comments/{comment_id}")
                    .route(web::get().to(handlers::get_comment))
                    .route(web::put().to(handlers::put_comment))
                    .route(web::patch().to(handlers::patch_comment))
                    .route(web::delete().to(handlers::delete_comment))
                    .default_service(web::to(handlers::method_not_allowed)),
            )
            .service(
                web::resource("/groups")
                    .route(web::get().to(handlers::list_groups))
                    .default_service(web::to(handlers::reject_group_write)),
            )
            .service(
                web::resource("/groups/{group_id}")
                    .route(web::get().to(handlers::get_group))
                    .default_service(web::to(handlers::reject_group_write)),
            )
            .default_service(web::to(handlers::not_found)),
    );
}
