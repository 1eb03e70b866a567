/// HTTP handlers for blog-service
///
/// - Posts: feed listing, single post, my posts, create/update/delete
/// - Engagement: likes and comments
/// - Auth: signup, login, profile
/// - Uploads: serving stored images
/// - Health: liveness and store readiness
pub mod auth;
pub mod engagement;
pub mod health;
pub mod posts;
pub mod uploads;

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;
use actix_web::{error, web};

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let message = match &err {
                error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
                other => format!("Invalid JSON body: {}", other),
            };
            AppError::Validation(message).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query string: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Post not found".to_string()).into())
}

/// Register every route under `/api` plus the `/uploads` file route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health::health))
                .route("/health/live", web::get().to(health::liveness))
                .service(
                    web::scope("/auth")
                        .route("/signup", web::post().to(auth::signup))
                        .route("/login", web::post().to(auth::login))
                        .service(
                            web::resource("/profile")
                                .wrap(JwtAuthMiddleware)
                                .route(web::get().to(auth::profile)),
                        )
                        .service(
                            web::resource("/profile-picture")
                                .wrap(JwtAuthMiddleware)
                                .route(web::put().to(auth::update_profile_picture)),
                        ),
                )
                .service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(posts::list_posts))
                                .route(web::post().to(posts::create_post)),
                        )
                        // Must precede "/{id}".
                        .service(
                            web::resource("/my-posts")
                                .wrap(JwtAuthMiddleware)
                                .route(web::get().to(posts::list_my_posts)),
                        )
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(posts::get_post))
                                .route(web::put().to(posts::update_post))
                                .route(web::delete().to(posts::delete_post)),
                        )
                        .service(
                            web::resource("/{id}/comments")
                                .wrap(JwtAuthMiddleware)
                                .route(web::post().to(engagement::add_comment)),
                        )
                        .service(
                            web::resource("/{id}/like")
                                .wrap(JwtAuthMiddleware)
                                .route(web::post().to(engagement::toggle_like)),
                        ),
                ),
        )
        .route("/uploads/{name}", web::get().to(uploads::serve_upload));
}
