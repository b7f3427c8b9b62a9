/// HTML pages and the form actions behind them
///
/// Actions answer with `303 See Other` so a reload never resubmits. Actions
/// that need a session send anonymous visitors to `/login` before touching
/// any service.
pub mod auth;
pub mod feed;
pub mod post;
pub mod profile;

use crate::error::AppError;
use crate::middleware::Viewer;
use crate::views;
use actix_web::{http::header, http::StatusCode, web, HttpResponse, ResponseError};

pub const LOGIN_PATH: &str = "/login";

pub(crate) fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn login_redirect() -> HttpResponse {
    see_other(LOGIN_PATH)
}

/// Error page with the server message shown as-is
pub(crate) fn error_page(err: &AppError, viewer: &Viewer) -> HttpResponse {
    let status = err.status_code();
    let message = match err {
        AppError::Database(detail) => {
            tracing::error!(error = %detail, "database error while rendering page");
            "Erro interno do servidor".to_string()
        }
        other => other.message(),
    };

    let body = format!(
        r#"<h1>{}</h1>
<p class="banner" role="alert">{}</p>
<p><a href="/">Voltar ao início</a></p>"#,
        status.as_u16(),
        views::escape_html(&message),
    );
    html(status, views::page("Erro", viewer.user(), &body))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(feed::home))
        .route("/recent", web::get().to(feed::recent))
        .route("/feed/page", web::get().to(feed::next_page))
        .service(
            web::resource("/login")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login_submit)),
        )
        .service(
            web::resource("/register")
                .route(web::get().to(auth::register_form))
                .route(web::post().to(auth::register_submit)),
        )
        .service(
            web::resource("/logout")
                .route(web::get().to(auth::logout))
                .route(web::post().to(auth::logout)),
        )
        .route("/posts/{post_id}/like", web::post().to(post::like_post))
        .route("/posts/{post_id}/unlike", web::post().to(post::unlike_post))
        .route(
            "/comments/{comment_id}/edit",
            web::post().to(post::edit_comment),
        )
        .route(
            "/comments/{comment_id}/{action}",
            web::post().to(post::comment_action),
        )
        .route(
            "/{author_id}/{post_id}/comments",
            web::post().to(post::create_comment),
        )
        .route("/{author_id}/{post_id}", web::get().to(post::show_post))
        .route("/{username}", web::get().to(profile::profile));
}
