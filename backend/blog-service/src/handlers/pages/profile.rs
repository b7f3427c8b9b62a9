use super::{error_page, html};
use crate::error::AppError;
use crate::middleware::Viewer;
use crate::services::{AuthService, PostService};
use crate::views;
use actix_web::{http::StatusCode, web, HttpResponse};

/// `/{username}`
pub async fn profile(
    auth: web::Data<AuthService>,
    posts: web::Data<PostService>,
    viewer: Viewer,
    username: web::Path<String>,
) -> HttpResponse {
    let username = username.into_inner();

    let user = match auth.find_by_name(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let err = AppError::NotFound(format!("Usuário {} não encontrado", username));
            return error_page(&err, &viewer);
        }
        Err(err) => return error_page(&err, &viewer),
    };

    match posts.posts_by_author(user.id).await {
        Ok(list) => html(
            StatusCode::OK,
            views::page(
                &user.name,
                viewer.user(),
                &views::profile_page(&user.name, &list),
            ),
        ),
        Err(err) => error_page(&err, &viewer),
    }
}
