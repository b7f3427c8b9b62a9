/// JSON API under `/api/v1`
pub mod auth;
pub mod comments;
pub mod posts;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::resource("/posts")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .route("/posts/{post_id}", web::get().to(posts::get_post))
            .service(
                web::resource("/posts/{post_id}/likes")
                    .route(web::post().to(posts::like_post))
                    .route(web::delete().to(posts::unlike_post)),
            )
            .service(
                web::resource("/posts/{post_id}/comments")
                    .route(web::get().to(comments::list_comments))
                    .route(web::post().to(comments::create_comment)),
            )
            .service(
                web::resource("/comments/{comment_id}")
                    .route(web::patch().to(comments::update_comment))
                    .route(web::delete().to(comments::delete_comment)),
            )
            .service(
                web::resource("/comments/{comment_id}/likes")
                    .route(web::post().to(comments::like_comment))
                    .route(web::delete().to(comments::unlike_comment)),
            )
            .route("/auth/register", web::post().to(auth::register))
            .route("/auth/login", web::post().to(auth::login))
            .route("/health", web::get().to(super::health::health))
            .route("/health/ready", web::get().to(super::health::ready))
            .route("/health/live", web::get().to(super::health::live)),
    );
}
